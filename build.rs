use std::{env, fs, path::Path};

fn main() {
    // OUT_DIR = target/debug/build/<crate>/out — the binary itself lives
    // three levels up, which is where config.json must land.
    let out_dir = env::var("OUT_DIR").expect("Cannot read OUT_DIR");

    let exe_dir = Path::new(&out_dir)
        .ancestors()
        .nth(3)
        .expect("Cannot find executable directory");

    let dst = exe_dir.join("config.json");

    match fs::copy("config.json", &dst) {
        Ok(_) => println!("cargo:warning=Copied config.json → {}", dst.display()),
        Err(e) => println!("cargo:warning=Could NOT copy config.json: {}", e),
    }

    println!("cargo:rerun-if-changed=config.json");
}
