//! 环境变量覆盖容器配置的测试
//!
//! 单独成为一个测试二进制，避免与其他读取环境变量的测试并发

use di_impl::load_container_config;
use std::io::Write;

const DEPTH_VAR: &str = "ADSP_DI__CONTAINER__MAX_RESOLUTION_DEPTH";

#[test]
fn test_environment_overrides_config_file() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    writeln!(file, "[container]\nvalidate_scopes = true\nmax_resolution_depth = 8").unwrap();

    let from_file = load_container_config(Some(file.path())).unwrap();
    assert_eq!(from_file.max_resolution_depth, 8);

    std::env::set_var(DEPTH_VAR, "7");
    let result = load_container_config(Some(file.path()));
    std::env::remove_var(DEPTH_VAR);

    let container = result.unwrap();
    assert_eq!(container.max_resolution_depth, 7);
    // 未被覆盖的键仍取自文件
    assert!(container.validate_scopes);
}
