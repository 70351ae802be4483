fn main() {
    if let Err(err) = adac_diagram::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
