fn main() {
    if let Err(err) = rivd::migrate_cli::run_entry(std::env::args().skip(1)) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
