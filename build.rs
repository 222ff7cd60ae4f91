fn main() {
    // MultitouchSupport 是私有框架，不在默认的 framework 搜索路径里
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("macos") {
        println!("cargo:rustc-link-search=framework=/System/Library/PrivateFrameworks");
        println!("cargo:rustc-link-lib=framework=MultitouchSupport");
        println!("cargo:rustc-link-lib=framework=CoreFoundation");
    }
}
