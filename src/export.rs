//! CSV出力

use std::io::Write;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use tracing::info;

use crate::dataset::{Dataset, COLUMNS};
use crate::error::ScraperError;

pub const DEFAULT_EXPORT_FILE_NAME: &str = "products.csv";

/// ヘッダー行付きで書き出す。欠損値は空文字列
pub fn write_csv<W: Write>(dataset: &Dataset, writer: W) -> Result<(), ScraperError> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .delimiter(b',')
        .from_writer(writer);

    writer.write_record(COLUMNS)?;
    for row in dataset.rows() {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn to_csv_bytes(dataset: &Dataset) -> Result<Vec<u8>, ScraperError> {
    let mut buf = Vec::new();
    write_csv(dataset, &mut buf)?;
    Ok(buf)
}

pub fn save_csv(dataset: &Dataset, path: impl AsRef<Path>) -> Result<PathBuf, ScraperError> {
    let path = path.as_ref().to_path_buf();
    let file = std::fs::File::create(&path)?;
    write_csv(dataset, file)?;
    info!("Saved {} products to {:?}", dataset.len(), path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::dataset::Record;

    fn sample() -> Dataset {
        Dataset::new(
            "https://shop/c",
            Utc::now(),
            vec![
                Record {
                    name: Some("Mercurial Vapor 16".into()),
                    subtitle: Some("Firm-Ground, Low-Top".into()),
                    price: Some("€1,289.99".into()),
                    image_url: Some("https://img/1.png".into()),
                    product_link: Some("/t/mercurial".into()),
                },
                Record::default(),
                Record {
                    name: Some("Say \"Boot\"".into()),
                    price: None,
                    ..Default::default()
                },
            ],
        )
    }

    #[test]
    fn test_round_trip() {
        let dataset = sample();
        let bytes = to_csv_bytes(&dataset).unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), COLUMNS.to_vec());

        let read_back: Vec<Record> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(read_back.len(), dataset.len());
        assert_eq!(read_back, dataset.records());
    }

    #[test]
    fn test_header_written_for_empty_dataset() {
        let dataset = Dataset::new("https://shop/c", Utc::now(), Vec::new());
        let csv = String::from_utf8(to_csv_bytes(&dataset).unwrap()).unwrap();
        assert_eq!(csv, "Name,Subtitle,Price,Image URL,Product Link\n");
    }

    #[test]
    fn test_missing_fields_are_empty_strings() {
        let csv = String::from_utf8(to_csv_bytes(&sample()).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], ",,,,");
    }

    #[test]
    fn test_save_csv() {
        let path = std::env::temp_dir().join(format!("listing-harvester-{}.csv", std::process::id()));
        let saved = save_csv(&sample(), &path).unwrap();
        let content = std::fs::read_to_string(&saved).unwrap();
        assert!(content.starts_with("Name,Subtitle,Price,Image URL,Product Link"));
        std::fs::remove_file(&saved).unwrap();
    }
}
