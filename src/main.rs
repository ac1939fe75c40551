fn main() {
    if let Err(err) = inventory_bot::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
