fn main() {
    if let Err(err) = rotolabel::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
