use clap::{Parser, Subcommand};
use simple_blog::highlight::HighlighterRegistry;
use simple_blog::{config, generate, output};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "simple-blog")]
#[command(about = "Static blog generator: markdown posts in, HTML and RSS out")]
#[command(long_about = "\
Static blog generator: markdown posts in, HTML and RSS out

Content structure:

  content/
  ├── config.toml                     # Site config (title required)
  └── posts/
      ├── 2024-01-05-hello-world.md   # Date and slug from the filename
      ├── rust-and-csharp.md          # ...or from front matter
      └── series/
          └── part-one.md             # Subdirectories are just grouping

Every post starts with TOML front matter between +++ fences:

  +++
  title = \"Hello, world\"
  date = 2024-01-05
  tags = [\"meta\"]
  +++

Output: index.html, <slug>/index.html, tags/<tag>/index.html, feed.xml.
Set SIMPLE_BLOG_LOG=debug for diagnostics.

Run 'simple-blog gen-config' to generate a documented config.toml.")]
#[command(version = env!("SIMPLE_BLOG_VERSION"))]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the blog into the output directory
    Build {
        /// Ignore the render cache and rewrite every file
        #[arg(long)]
        no_cache: bool,
    },
    /// Load and render in memory without writing anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("SIMPLE_BLOG_LOG", "warn"))
        .init();

    let cli = Cli::parse();
    let highlighters = HighlighterRegistry::with_defaults();

    match cli.command {
        Command::Build { no_cache } => {
            println!("==> Building {} \u{2192} {}", cli.source.display(), cli.output.display());
            let result = generate::build(&cli.source, &cli.output, !no_cache, &highlighters)?;
            output::print_scan_output(&result.content);
            println!();
            output::print_build_output(&result);
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let (content, site) = generate::check(&cli.source, &highlighters)?;
            output::print_scan_output(&content);
            println!();
            output::print_site_output(&site);
            println!("==> Content is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
