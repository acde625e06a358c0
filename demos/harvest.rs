use listing_harvester::{export, HarvestRequest, HarvestService};
use tower::Service;

const DEFAULT_URL: &str = "https://www.nike.com/lu/en/w/football-shoes-1gdj0zy7ok";

#[tokio::main]
async fn main() {
    // ログ設定
    tracing_subscriber::fmt()
        .with_env_filter("info,listing_harvester=debug")
        .init();

    let url = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_URL.to_string());
    let headless = std::env::var("HEADLESS").map(|v| v != "0").unwrap_or(true);

    let mut service = match HarvestService::new() {
        Ok(service) => service,
        Err(e) => {
            eprintln!("エラー: {}", e);
            return;
        }
    };

    println!("=== Listing Harvester ===");

    let request = HarvestRequest::new(&url).with_headless(headless);
    match service.call(request).await {
        Ok(dataset) => {
            println!("Scraped {} products!", dataset.len());
            for row in dataset.rows().take(5) {
                println!("  {}", row.join(" | "));
            }
            match export::save_csv(&dataset, export::DEFAULT_EXPORT_FILE_NAME) {
                Ok(path) => println!("CSV保存先: {:?}", path),
                Err(e) => eprintln!("エラー: {}", e),
            }
        }
        Err(e) => {
            eprintln!("エラー: {}", e);
        }
    }
}
