//! Tests of the `kebab` binary.

#[cfg(test)]
mod tests {
    use assert_cmd::Command;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_unreachable_database_is_fatal() {
        let output = Command::cargo_bin("kebab")
            .unwrap()
            .args(["--dsn", "sqlite:/nonexistent/dir/shop.db", "int", "SELECT 1"])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(255));
        assert!(String::from_utf8_lossy(&output.stderr).contains("Error!:"));
    }

    #[test]
    fn test_unreachable_postgres_is_fatal() {
        let output = Command::cargo_bin("kebab")
            .unwrap()
            .args(["--dsn", "pgsql:host=127.0.0.1;port=1;user=kebab;dbname=shop;connect_timeout=2", "int", "SELECT 1"])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(255));
        assert!(String::from_utf8_lossy(&output.stderr).contains("postgres"));
    }

    #[test]
    fn test_query_through_dsn() {
        Command::cargo_bin("kebab")
            .unwrap()
            .args(["--dsn", "sqlite::memory:", "int", "SELECT 42"])
            .assert()
            .success()
            .stdout("42\n");
    }

    #[test]
    fn test_query_through_config_file() {
        let mut config = NamedTempFile::new().unwrap();
        config
            .write_all(b"[database]\ndriver = \"sqlite\"\nconnection_string = \":memory:\"\n")
            .unwrap();

        Command::cargo_bin("kebab")
            .unwrap()
            .args(["--config", config.path().to_str().unwrap(), "row", "SELECT 1 AS one, 'x' AS two"])
            .assert()
            .success()
            .stdout("{\"one\":1,\"two\":\"x\"}\n");
    }

    #[test]
    fn test_usage_error() {
        Command::cargo_bin("kebab").unwrap().arg("int").assert().code(2);
    }
}
