use std::fs;
use std::path::PathBuf;

pub fn init(stdout: bool) -> Result<(), Box<dyn std::error::Error>> {
    // Read from samples/sample-config.yml
    let sample_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("samples")
        .join("sample-config.yml");
    let config_content = fs::read_to_string(&sample_path)
        .map_err(|e| format!("Failed to read sample config: {}", e))?;

    write_config(&config_content, stdout)
}

fn write_config(config_content: &str, stdout: bool) -> Result<(), Box<dyn std::error::Error>> {
    if stdout {
        print!("{}", config_content);
        Ok(())
    } else {
        // Try to write to ~/.config/streamgate/config.yml first
        let config_path = if let Some(home_dir) = dirs::home_dir() {
            let user_config = home_dir.join(".config/streamgate/config.yml");

            // Create parent directory if it doesn't exist
            if let Some(parent) = user_config.parent() {
                match fs::create_dir_all(parent) {
                    Ok(_) => Some(user_config),
                    Err(_) => {
                        // Fall back to /etc/streamgate/config.yml
                        eprintln!("Warning: Could not create directory {}", parent.display());
                        eprintln!("Falling back to /etc/streamgate/config.yml");
                        None
                    }
                }
            } else {
                None
            }
        } else {
            None
        };

        let config_path =
            config_path.unwrap_or_else(|| PathBuf::from("/etc/streamgate/config.yml"));

        // Check if file already exists
        if config_path.exists() {
            eprintln!(
                "Error: Config file already exists at {}",
                config_path.display()
            );
            eprintln!("Remove it first or use --stdout to print the config");
            std::process::exit(1);
        }

        // Create parent directory for /etc/streamgate if needed
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write the config file
        fs::write(&config_path, config_content)?;

        println!("Config file written to {}", config_path.display());
        Ok(())
    }
}

pub fn validate(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path.ok_or("No config file found. Use --config to specify a path.")?;

    println!("Validating config file: {}", path.display());

    // Load and validate the config
    match crate::config::load_config(&path) {
        Ok(_) => {
            println!("✓ Config is valid");
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Config validation failed:\n{}", e);
            std::process::exit(1);
        }
    }
}
