use clap::Parser;
use repetition_threshold::cli::*;

pub fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(error) = Cli::parse().run() {
        log::error!("{error}");
        std::process::exit(1);
    }
}
