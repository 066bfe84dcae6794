fn main() {
    let url = std::env::args().nth(1).expect("Missing url");
    let output = std::env::args()
        .nth(2)
        .unwrap_or_else(|| String::from("temperature_daily.csv"));

    let response = match ureq::get(&url).call() {
        Ok(response) => response,
        Err(e) => {
            eprintln!("Could not fetch the table with url: `{url}`. {e}");
            std::process::exit(1);
        }
    };

    let table = response.into_string().unwrap();
    std::fs::write(&output, &table).unwrap();

    println!("Wrote {output}");
}
