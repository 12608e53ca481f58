fn main() {
    if let Err(e) = xpander_lib::run() {
        eprintln!("xpander: {}", e);
        std::process::exit(1);
    }
}
