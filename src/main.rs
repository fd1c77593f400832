use graceful_stop::{app, cli};

fn main() {
    let args = cli::parse();
    let status = app::run(&args);
    std::process::exit(status.code())
}
