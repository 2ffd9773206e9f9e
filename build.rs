fn main() {
    // XOR key for obfuscation (16 bytes)
    const XOR_KEY: [u8; 16] = [
        0x4e, 0x65, 0x78, 0x6c, 0x79, 0x6e, 0x47, 0x72, 0x69, 0x64, 0x45, 0x78, 0x70, 0x65, 0x72,
        0x74,
    ];

    // Check if GEMINI_API_KEY environment variable is set at build time
    if let Ok(api_key) = std::env::var("GEMINI_API_KEY") {
        if !api_key.is_empty() {
            let obfuscated: Vec<u8> = api_key
                .bytes()
                .enumerate()
                .map(|(i, b)| b ^ XOR_KEY[i % XOR_KEY.len()])
                .collect();

            let hex_encoded: String = obfuscated.iter().map(|b| format!("{:02x}", b)).collect();

            println!("cargo:rustc-env=OBFUSCATED_API_KEY={}", hex_encoded);
            println!("cargo:rustc-env=HAS_BUILTIN_KEY=1");
        } else {
            println!("cargo:rustc-env=OBFUSCATED_API_KEY=");
            println!("cargo:rustc-env=HAS_BUILTIN_KEY=0");
        }
    } else {
        println!("cargo:rustc-env=OBFUSCATED_API_KEY=");
        println!("cargo:rustc-env=HAS_BUILTIN_KEY=0");
    }

    println!("cargo:rerun-if-env-changed=GEMINI_API_KEY");
}
