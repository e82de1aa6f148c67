fn main() {
    built::write_built_file().expect("Failed to acquire build-time information");

    // Pass through AUTOASSIGN_GIT_HASH when the build environment sets it
    println!("cargo:rerun-if-env-changed=AUTOASSIGN_GIT_HASH");
    if let Ok(hash) = std::env::var("AUTOASSIGN_GIT_HASH") {
        println!("cargo:rustc-env=AUTOASSIGN_GIT_HASH={}", hash);
    }
}
