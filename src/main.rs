fn main() {
    if let Err(err) = starbook::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
