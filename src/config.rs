use clap::Parser;

// CLI argument structure; secrets come from the environment like the
// rest of the deployment configuration.
#[derive(Parser, Debug, Clone)]
#[command(name = "codebot-api")]
#[command(about = "Backend relay for a coding assistant backed by the Gemini API")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    // Gemini API key; startup fails without one
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: String,

    // Model used for every operation
    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-2.0-flash-exp")]
    pub model: String,

    // Base URL of the generative-language API
    #[arg(long, default_value = "https://generativelanguage.googleapis.com")]
    pub api_base_url: String,

    // Output token ceiling for code generation
    #[arg(long, env = "MAX_OUTPUT_TOKENS", default_value_t = 4096)]
    pub max_output_tokens: u32,

    // Attempt ceiling for outbound model calls
    #[arg(long, default_value_t = 3)]
    pub max_attempts: u32,

    // Base backoff delay between attempts, in seconds
    #[arg(long, default_value_t = 1)]
    pub retry_base_delay: u64,

    // Frontend origin allowed by CORS
    #[arg(long, env = "FRONTEND_URL", default_value = "http://localhost:3000")]
    pub frontend_url: String,

    // How often idle rate-limiter clients are evicted, in seconds
    #[arg(long, default_value_t = 300)]
    pub sweep_interval: u64,
}
