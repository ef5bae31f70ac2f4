use clap::Parser;
use dotenv::dotenv;
use grains_api::api;
use grains_api::config::Settings;
use grains_api::database::VectorDB;
use grains_api::providers::{CompletionProvider, GeminiProvider, MistralOcr};
use grains_api::rag::pipeline::{ProductRetriever, RagPipeline};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(long, default_value = "3000")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let settings = Settings::from_env()?;

    // Connection-tested at startup so bad settings fail here, not per request
    let vector_db = VectorDB::new(&settings.qdrant_url).await?;

    let gemini = Arc::new(GeminiProvider::new(&settings));
    let retriever = Arc::new(ProductRetriever::new(
        vector_db,
        gemini.clone(),
        settings.qdrant_collection.clone(),
        settings.top_k,
    ));
    let pipeline = Arc::new(RagPipeline::new(retriever, gemini.clone()));
    let ocr = Arc::new(MistralOcr::new(&settings));

    let app = api::create_api(pipeline, ocr);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    log::info!(
        "grains-api listening on {} (chat model {})",
        addr,
        gemini.model_info()
    );

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
