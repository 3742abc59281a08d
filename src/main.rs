use anyhow::Context;
use chaoscipher::{metrics, Algorithm, Image, Settings};
use clap::{Parser, Subcommand};
use image::{DynamicImage, ImageReader};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// chaoscipher - Chaotic-map image encryption
///
/// Encrypts and decrypts lossless images with keyed chaotic permutation and
/// diffusion. The same key (and nonce, where required) restores the exact
/// original pixels.
#[derive(Parser)]
#[command(name = "chaoscipher")]
#[command(version)]
#[command(about = "Chaotic-map image encryption", long_about = None)]
struct Cli {
    /// JSON file overriding tuning constants (burn-in lengths, memory window)
    #[arg(long, global = true, env = "CHAOSCIPHER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt an image
    Encrypt {
        /// Input image path
        #[arg(short, long)]
        input: PathBuf,

        /// Output cipher image path (lossless format)
        #[arg(short, long)]
        output: PathBuf,

        /// Algorithm name (see `list`)
        #[arg(short, long, default_value = "fodhnn")]
        algorithm: Algorithm,

        /// Secret key
        #[arg(short, long, env = "CHAOSCIPHER_KEY", hide_env_values = true)]
        key: String,

        /// Per-image nonce (required by every algorithm except `chaos`)
        #[arg(short, long)]
        nonce: Option<String>,

        /// Print entropy, NPCR and UACI of the result
        #[arg(long)]
        report: bool,
    },
    /// Decrypt a cipher image
    Decrypt {
        /// Cipher image path
        #[arg(short, long)]
        input: PathBuf,

        /// Output image path (lossless format)
        #[arg(short, long)]
        output: PathBuf,

        /// Algorithm name used for encryption
        #[arg(short, long, default_value = "fodhnn")]
        algorithm: Algorithm,

        /// Secret key (must match the encryption key)
        #[arg(short, long, env = "CHAOSCIPHER_KEY", hide_env_values = true)]
        key: String,

        /// Nonce used for encryption
        #[arg(short, long)]
        nonce: Option<String>,
    },
    /// List available algorithms
    List,
    /// Show non-secret parameters of an algorithm/key pair as JSON
    Info {
        #[arg(short, long)]
        algorithm: Algorithm,

        #[arg(short, long, env = "CHAOSCIPHER_KEY", hide_env_values = true)]
        key: String,
    },
    /// Print image statistics, optionally against a second image
    Analyze {
        /// Image to analyze
        #[arg(short, long)]
        input: PathBuf,

        /// Second image of the same shape for NPCR/UACI/PSNR
        #[arg(short, long)]
        compare: Option<PathBuf>,
    },
}

/// Validate that the output format is lossless (not JPEG)
fn validate_lossless_format(path: &Path) -> anyhow::Result<()> {
    let Some(ext) = path.extension() else {
        return Err(anyhow::anyhow!("Output file must have an extension (e.g., .png)"));
    };
    let ext_lower = ext.to_string_lossy().to_lowercase();
    match ext_lower.as_str() {
        "jpg" | "jpeg" => Err(anyhow::anyhow!(
            "JPEG is a lossy format and would make the image undecryptable!\n\
             Please use a lossless format instead:\n\
             • PNG (recommended) - .png\n\
             • BMP - .bmp\n\
             • TIFF - .tif or .tiff"
        )),
        "png" | "bmp" | "tif" | "tiff" => Ok(()),
        _ => {
            tracing::warn!(
                "Unknown format '.{}', cipher images require a lossless format",
                ext_lower
            );
            Ok(())
        }
    }
}

fn load_image(path: &Path) -> anyhow::Result<Image> {
    let decoded = ImageReader::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?
        .decode()
        .with_context(|| format!("Failed to decode {}", path.display()))?;

    let decoded = if decoded.color().has_alpha() {
        tracing::warn!("Dropping alpha channel of {}", path.display());
        if decoded.color().has_color() {
            DynamicImage::ImageRgb8(decoded.to_rgb8())
        } else {
            DynamicImage::ImageLuma8(decoded.to_luma8())
        }
    } else {
        decoded
    };

    let image = Image::try_from(&decoded)?;
    tracing::info!("Loaded {} with shape {:?}", path.display(), image.shape());
    Ok(image)
}

fn save_image(image: Image, path: &Path) -> anyhow::Result<()> {
    validate_lossless_format(path)?;
    image
        .into_dynamic()
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Saved {}", path.display());
    Ok(())
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    match path {
        Some(path) => {
            tracing::debug!("Loading settings from {}", path.display());
            Settings::load(path)
        }
        None => Ok(Settings::default()),
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logger
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chaoscipher=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Encrypt {
            input,
            output,
            algorithm,
            key,
            nonce,
            report,
        } => {
            // Fail before doing any work if the output would be lossy
            validate_lossless_format(&output)?;
            let plain = load_image(&input)?;

            let cipher = algorithm.cipher(&settings);
            tracing::info!("Encrypting with {}", cipher.algorithm_name());
            let encrypted = cipher.encrypt_image(&plain, &key, nonce.as_deref())?;

            if report {
                println!("Entropy (plain):  {:.4} bits", metrics::entropy(plain.as_bytes()));
                println!("Entropy (cipher): {:.4} bits", metrics::entropy(encrypted.as_bytes()));
                println!("NPCR:             {:.4}%", metrics::npcr(&plain, &encrypted)?);
                println!("UACI:             {:.4}%", metrics::uaci(&plain, &encrypted)?);
            }

            save_image(encrypted, &output)?;
        }

        Commands::Decrypt {
            input,
            output,
            algorithm,
            key,
            nonce,
        } => {
            validate_lossless_format(&output)?;
            let encrypted = load_image(&input)?;

            let cipher = algorithm.cipher(&settings);
            tracing::info!("Decrypting with {}", cipher.algorithm_name());
            let plain = cipher.decrypt_image(&encrypted, &key, nonce.as_deref())?;

            save_image(plain, &output)?;
        }

        Commands::List => {
            for alg in Algorithm::ALL {
                let nonce = if alg.cipher(&settings).requires_nonce() {
                    "key + nonce"
                } else {
                    "key only"
                };
                println!("{:<8}  {}", alg.name(), nonce);
            }
            println!("(acm_2dscl is accepted as an alias of hybrid)");
        }

        Commands::Info { algorithm, key } => {
            let info = algorithm.cipher(&settings).encryption_info(&key);
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Analyze { input, compare } => {
            let image = load_image(&input)?;
            println!("Shape:    {:?}", image.shape());
            println!("Entropy:  {:.4} bits", metrics::entropy(image.as_bytes()));

            if let Some(other) = compare {
                let other = load_image(&other)?;
                println!("NPCR:     {:.4}%", metrics::npcr(&image, &other)?);
                println!("UACI:     {:.4}%", metrics::uaci(&image, &other)?);
                println!("PSNR:     {:.2} dB", metrics::psnr(&image, &other)?);
            }
        }
    }

    Ok(())
}
