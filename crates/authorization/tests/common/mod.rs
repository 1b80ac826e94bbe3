use std::path::Path;

use serde::de::DeserializeOwned;

#[allow(dead_code)]
pub fn test_data(path: &str) -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(path)
        .to_string_lossy()
        .to_string()
}

#[allow(dead_code)]
pub fn load<T: DeserializeOwned>(path: &str) -> T {
    let contents = std::fs::read_to_string(test_data(path)).unwrap();
    serde_yaml::from_str(&contents).unwrap()
}
