fn main() {
    env_logger::init();
    if let Err(err) = ggcov_diagram::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
