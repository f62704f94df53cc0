use lambda_http::{run, service_fn, tracing, Error};
mod config;
mod error;
mod http_handler;
mod letter;
mod store;
use config::Config;
use http_handler::function_handler;
use store::DynamoLetterStore;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    let config = Config::from_env()?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let client = aws_sdk_dynamodb::Client::new(&aws_config);
    let store = DynamoLetterStore::new(client, config.letters_table.clone());

    run(service_fn(|event| {
        function_handler(&store, &config, event)
    })).await
}
