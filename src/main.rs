use clap::Parser;
use floret_gateway::Gateway;
use floret_gateway::app_state::{AppConfig, DEFAULT_MAX_UPLOAD_BYTES, StorageConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "floret-gateway")]
#[command(about = "Forwards uploaded images to a hosted classifier and normalizes its answer")]
struct CliArgs {
    /// Host address to bind the server
    #[arg(long, env = "FLORET_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port number to bind the server
    #[arg(long, env = "FLORET_PORT", default_value_t = 5000)]
    port: u16,

    /// Upstream inference endpoint
    #[arg(long, env = "FLORET_INFERENCE_URL")]
    inference_url: String,

    /// How the image is sent upstream
    #[arg(
        long,
        env = "FLORET_REQUEST_FORMAT",
        default_value = "multipart",
        value_parser = ["multipart", "base64"]
    )]
    request_format: String,

    /// Gradio function index, sent with the base64 request format
    #[arg(long, env = "FLORET_FN_INDEX")]
    fn_index: Option<u32>,

    /// Layout of the upstream response
    #[arg(
        long,
        env = "FLORET_RESPONSE_SHAPE",
        default_value = "auto",
        value_parser = ["named", "positional", "auto"]
    )]
    response_shape: String,

    /// Label field for the named response shape
    #[arg(long, default_value = "label")]
    label_field: String,

    /// Confidence field for the named response shape
    #[arg(long, default_value = "confidence")]
    confidence_field: String,

    /// Sequence field for the positional response shape
    #[arg(long, default_value = "data")]
    data_field: String,

    /// URL of a JSON document listing class names by index
    #[arg(long, env = "FLORET_CLASS_NAMES_URL")]
    class_names_url: Option<String>,

    /// Local JSON class names document, takes precedence over the URL
    #[arg(long, env = "FLORET_CLASS_NAMES_FILE")]
    class_names_file: Option<PathBuf>,

    /// Key holding the class list when the document is an object (e.g. "flower")
    #[arg(long, env = "FLORET_CLASS_NAMES_KEY")]
    class_names_key: Option<String>,

    /// S3 bucket for storing uploads and results; storage is off when unset
    #[arg(long, env = "FLORET_S3_BUCKET")]
    s3_bucket: Option<String>,

    #[arg(long, env = "FLORET_S3_REGION", default_value = "us-east-1")]
    s3_region: String,

    #[arg(long, env = "FLORET_S3_PREFIX", default_value = "")]
    s3_prefix: String,

    /// Upstream request timeout in seconds (client default when unset)
    #[arg(long, env = "FLORET_TIMEOUT")]
    timeout: Option<u64>,

    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,

    #[arg(
        long,
        env = "FLORET_LOG_LEVEL",
        default_value = "info",
        value_parser = ["debug", "info", "warn", "error"]
    )]
    log_level: String,
}

impl CliArgs {
    fn into_app_config(self) -> AppConfig {
        let storage = self.s3_bucket.map(|bucket| StorageConfig {
            bucket,
            region: self.s3_region,
            prefix: self.s3_prefix,
        });
        AppConfig {
            host: self.host,
            port: self.port,
            inference_url: self.inference_url,
            request_format: self.request_format,
            fn_index: self.fn_index,
            response_shape: self.response_shape,
            label_field: self.label_field,
            confidence_field: self.confidence_field,
            data_field: self.data_field,
            class_names_url: self.class_names_url,
            class_names_file: self.class_names_file,
            class_names_key: self.class_names_key,
            storage,
            timeout: self.timeout,
            max_upload_bytes: self.max_upload_bytes,
            log_level: self.log_level,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    Gateway::new(args.into_app_config()).start()
}
