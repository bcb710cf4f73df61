use shrun_test_utils::builders::sh;
use shrun_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::test]
async fn test_environment_is_replaced() -> TestResult {
    init_tracing();

    let out = sh("printf %s \"${NAME}\"")
        .environment([("NAME", "joe")])
        .build()
        .run()
        .await?;

    assert_eq!(out.output_str(), "joe");
    Ok(())
}

#[tokio::test]
async fn test_replaced_environment_hides_ambient_variables() -> TestResult {
    init_tracing();

    let out = sh("printf %s \"${CARGO_MANIFEST_DIR-unset}\"")
        .environment([("NAME", "joe")])
        .build()
        .run()
        .await?;

    assert_eq!(out.output_str(), "unset");
    Ok(())
}

#[tokio::test]
async fn test_unset_environment_is_inherited() -> TestResult {
    init_tracing();

    let expected = std::env::var("PATH")?;

    let out = sh("printf %s \"${PATH}\"").build().run().await?;

    assert_eq!(out.output_str(), expected);
    Ok(())
}

#[tokio::test]
async fn test_env_adds_to_replacement() -> TestResult {
    init_tracing();

    let out = sh("printf %s-%s \"$A\" \"$B\"")
        .env("A", "1")
        .env("B", "2")
        .build()
        .run()
        .await?;

    assert_eq!(out.output_str(), "1-2");
    Ok(())
}
