use crate::domain::ports::Storage;
use crate::utils::error::Result;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

const INDENT: &[u8] = b"    ";

/// 以 4 格縮排序列化，結尾補換行
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(INDENT));
    value.serialize(&mut serializer)?;
    buffer.push(b'\n');
    Ok(buffer)
}

pub async fn write_snapshot<S, T>(storage: &S, filename: &str, value: &T) -> Result<String>
where
    S: Storage,
    T: Serialize + ?Sized + Sync,
{
    let data = to_pretty_json(value)?;
    storage.write_file(filename, &data).await?;
    let output_path = storage.display_path(filename);
    tracing::info!("📁 Snapshot written: {} ({} bytes)", output_path, data.len());
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_space_indentation() {
        let value = serde_json::json!({"total_spaces": 1, "spaces": [{"space_key": "ENG"}]});
        let text = String::from_utf8(to_pretty_json(&value).unwrap()).unwrap();

        assert!(text.contains("\n    \"spaces\": [\n        {\n            \"space_key\": \"ENG\""));
        assert!(text.ends_with("}\n"));
    }
}
