use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use docx_cover::config::LOGO_MAPPING_FILE;
use docx_cover::logo_assets;
use docx_cover::{CoverRequest, Error, FieldMapping, Package, TemplateSpec};

#[derive(Parser)]
#[command(name = "docx-cover", about = "Fill DOCX cover templates with field values and logos")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Populate a template and write the cover
    Generate {
        /// DOCX template
        #[arg(long)]
        template: PathBuf,
        /// Directory of logo files
        #[arg(long)]
        logos: PathBuf,
        /// Institution name used to pick the logo
        #[arg(long, alias = "school")]
        name: String,
        /// Output file; a .pdf output also keeps the .docx next to it
        #[arg(long)]
        output: PathBuf,
        /// Field values as inline JSON or a path to a JSON file
        #[arg(long)]
        fields: Option<String>,
        /// Template specification JSON
        #[arg(long)]
        spec: Option<PathBuf>,
        /// LibreOffice executable used for .pdf output
        #[arg(long)]
        soffice: Option<PathBuf>,
    },
    /// Report the pictures and placeholders of a template as JSON
    Inspect {
        /// DOCX template
        template: PathBuf,
        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Template specification JSON
        #[arg(long)]
        spec: Option<PathBuf>,
    },
    /// Give logo files ASCII-safe names and write the display-name mapping
    LogoMapping {
        /// Directory of logo files
        #[arg(long)]
        logos: PathBuf,
        /// Mapping file (default: logo_mapping.json inside the logo directory)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Rename the files and write the mapping; without it nothing changes
        #[arg(long)]
        apply: bool,
    },
    /// Wrap bitmap logos in SVG files so they rank as vector assets
    SvgWrap {
        /// Directory of bitmap logos
        #[arg(long)]
        input: PathBuf,
        /// Output directory (default: <input>-svg next to the input)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let result = match args.command {
        Command::Generate { template, logos, name, output, fields, spec, soffice } => {
            fields.as_deref().map(FieldMapping::from_arg).transpose().and_then(|fields| {
                let request = CoverRequest {
                    template,
                    logo_dir: logos,
                    institution: name,
                    fields: fields.unwrap_or_default(),
                    output,
                    soffice,
                };
                generate(&request, spec.as_deref())
            })
        }
        Command::Inspect { template, output, spec } => {
            inspect(&template, output.as_deref(), spec.as_deref())
        }
        Command::LogoMapping { logos, out, apply } => logo_mapping(&logos, out, apply),
        Command::SvgWrap { input, output } => {
            let output = output.unwrap_or_else(|| logo_assets::svg_sibling(&input));
            svg_wrap(&input, &output)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        let code = match e {
            Error::InputMissing(_) | Error::MappingParse(_) => 2,
            _ => 1,
        };
        std::process::exit(code);
    }
}

fn load_spec(path: Option<&Path>) -> TemplateSpec {
    let Some(path) = path else {
        return TemplateSpec::default();
    };
    match TemplateSpec::load(path) {
        Ok(spec) => {
            log::info!("loaded template spec from {}", path.display());
            spec
        }
        Err(e) => {
            log::warn!("failed to load template spec {}: {e}; using defaults", path.display());
            TemplateSpec::default()
        }
    }
}

fn generate(request: &CoverRequest, spec: Option<&Path>) -> Result<(), Error> {
    let spec = load_spec(spec);
    let report = docx_cover::generate_cover(request, &spec)?;

    match &report.logo {
        Some(logo) => println!("Logo: {}", logo.display()),
        None => println!("Logo: none"),
    }
    println!("Placeholders replaced: {}", report.substitutions);
    println!("Saved {}", report.docx.display());
    if let Some(pdf) = &report.pdf {
        println!("Saved {}", pdf.display());
    }
    for warning in &report.warnings {
        eprintln!("Warning: {warning}");
    }
    Ok(())
}

fn inspect(template: &Path, output: Option<&Path>, spec: Option<&Path>) -> Result<(), Error> {
    let spec = load_spec(spec);
    let package = Package::open(template)?;
    let report = docx_cover::analyzer::analyze(&package, &spec)?;
    let json = serde_json::to_string_pretty(&report)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            println!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn logo_mapping(logos: &Path, out: Option<PathBuf>, apply: bool) -> Result<(), Error> {
    let plan = logo_assets::plan_mapping(logos)?;
    for rename in &plan.renames {
        println!("Rename: {rename}");
    }
    if !apply {
        println!("{}", plan.mapping.to_json()?);
        println!("Dry run: {} file(s) would be renamed; pass --apply to do it", plan.renames.len());
        return Ok(());
    }
    let out = out.unwrap_or_else(|| logos.join(LOGO_MAPPING_FILE));
    logo_assets::apply_plan(logos, &plan, &out)?;
    println!("Wrote {}", out.display());
    Ok(())
}

fn svg_wrap(input: &Path, output: &Path) -> Result<(), Error> {
    let written = logo_assets::wrap_directory(input, output)?;
    println!("Wrote {} SVG file(s) to {}", written.len(), output.display());
    Ok(())
}
