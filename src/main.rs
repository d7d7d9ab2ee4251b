fn main() {
    if let Err(err) = service_change_map::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
