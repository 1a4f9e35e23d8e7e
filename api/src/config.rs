use clap::Parser;

#[derive(Debug, Parser)]
#[clap(name = "roster", about = "Players and teams over HTTP")]
pub struct Config {
    #[clap(long, env, default_value_t = String::from("127.0.0.1"))]
    pub host: String,
    #[clap(short, long, env, default_value_t = 7205)]
    pub port: u16,

    #[clap(long, env, default_value_t = String::from("production"))]
    pub env: String,

    /// Path to the SQLite database file. It is created if it does not exist.
    #[clap(long = "db", env)]
    pub database_url: String,
    #[clap(long, env, default_value_t = 8)]
    pub database_max_connections: usize,

    #[clap(long, env)]
    pub honeycomb_team: Option<String>,
    #[clap(long, env, default_value_t = String::from("dev"))]
    pub honeycomb_dataset: String,
}
