use localnet_config::{ConfigLoader, FailurePolicy, FileLoader, GeneratorConfig, Subnet};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Localnet Configuration Basic Usage Example");
    println!("==========================================\n");

    // Example 1: Defaults
    println!("1. Default generator configuration:");
    let config = GeneratorConfig::default();
    println!("   Output: {}", config.output_dir.display());
    println!("   Image: {}", config.image);
    println!(
        "   Network: {} on {} (gateway {}, {} hosts)",
        config.network.name,
        config.network.subnet,
        config.network.subnet.gateway(),
        config.network.subnet.host_capacity()
    );
    println!("   Host ports start at {}\n", config.ports.host_base);

    // Example 2: Save and reload
    println!("2. Saving and loading configuration files:");
    let dir = tempfile::tempdir()?;
    let toml_path = dir.path().join("localnet.toml");
    let json_path = dir.path().join("localnet.json");

    let mut custom = config.clone();
    custom.archive_nodes = 2;
    custom.failure_policy = FailurePolicy::Lenient;
    custom.network.subnet = "10.1.0.0/16".parse::<Subnet>()?;

    FileLoader::save_toml(&custom, &toml_path)?;
    FileLoader::save_json(&custom, &json_path)?;
    println!("   Saved {} and {}", toml_path.display(), json_path.display());

    let loaded = ConfigLoader::new().load(Some(&toml_path))?;
    println!(
        "   Loaded: {} archive nodes, {} policy, subnet {}\n",
        loaded.archive_nodes, loaded.failure_policy, loaded.network.subnet
    );

    // Example 3: Validation
    println!("3. Validation:");
    let mut crowded = GeneratorConfig::default();
    crowded.network.subnet = "10.0.7.0/30".parse()?;
    crowded.archive_nodes = 1;
    match crowded.validate() {
        Ok(()) => println!("   Configuration is valid"),
        Err(e) => println!("   Rejected: {}", e),
    }

    Ok(())
}
