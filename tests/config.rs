mod support;

use predicates::str::contains;

use support::DataDir;

#[test]
fn config_in_data_dir_renames_slots() -> Result<(), Box<dyn std::error::Error>> {
    let data = DataDir::new()?;
    data.write_config(
        r#"
[storage]
tasks_key = "my_tasks"
categories_key = "my_categories"
"#,
    )?;

    data.cmd().args(["add", "Configured"]).assert().success();
    data.cmd().args(["category", "add", "Home"]).assert().success();

    assert!(data.read_slot("my_tasks").is_some());
    assert!(data.read_slot("my_categories").is_some());
    assert_eq!(data.read_slot("TASKMATE_TASKS"), None);
    Ok(())
}

#[test]
fn custom_palette_is_used() -> Result<(), Box<dyn std::error::Error>> {
    let data = DataDir::new()?;
    data.write_config(
        r##"
[categories]
palette = ["#000000"]
fallback_color = "#111111"
"##,
    )?;

    data.cmd()
        .args(["category", "add", "A"])
        .assert()
        .success()
        .stdout(contains("(#000000)"));
    data.cmd().args(["add", "x"]).assert().success();
    data.cmd()
        .args(["list"])
        .assert()
        .success()
        .stdout(contains("Umum (#111111)"));
    Ok(())
}

#[test]
fn explicit_invalid_config_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let data = DataDir::new()?;
    let path = data.write_config(
        r#"
[storage]
tasks_key = "same"
categories_key = "same"
"#,
    )?;

    data.cmd()
        .arg("--config")
        .arg(&path)
        .args(["list"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("Invalid configuration"));

    // The same file found implicitly falls back to defaults
    data.cmd().args(["list"]).assert().success();
    Ok(())
}

#[test]
fn missing_explicit_config_is_operation_failure() -> Result<(), Box<dyn std::error::Error>> {
    let data = DataDir::new()?;
    data.cmd()
        .arg("--config")
        .arg(data.path().join("nope.toml"))
        .args(["list"])
        .assert()
        .failure()
        .code(4);
    Ok(())
}
