use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use d3flux_core::display_tools::{
    color_redox_rxns, update_cofactors, ColorRedoxOptions, COMMON_COFACTORS,
};
use d3flux_core::flux::apply_fluxes;
use d3flux_core::flux_map::{annotate, flux_map, FluxMapOptions};
use d3flux_core::io::json::read_flux_map;
use d3flux_core::metabolic_model::model::Model;
use d3flux_core::optimize::Solution;
use d3flux_core::render::RenderOptions;

#[derive(Parser, Debug)]
#[command(name = "d3flux")]
#[command(about = "Draw flux maps of metabolic models as interactive d3 figures", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a model as an HTML flux map
    Render(RenderArgs),
    /// Annotate a model and write it back as JSON
    Annotate(AnnotateArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// Output file, printed to stdout if not given
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    out: Option<PathBuf>,

    /// Write a complete HTML page instead of a fragment
    #[arg(long = "standalone")]
    standalone: bool,

    /// Id of the figure element
    #[arg(long = "figure-id", value_name = "ID", help_heading = "Figure")]
    figure_id: Option<String>,

    /// Canvas width in pixels
    #[arg(long = "width", value_name = "N", requires = "height", help_heading = "Figure")]
    width: Option<u32>,

    /// Canvas height in pixels
    #[arg(long = "height", value_name = "N", requires = "width", help_heading = "Figure")]
    height: Option<u32>,

    /// Label size in pt
    #[arg(long = "fontsize", value_name = "F", help_heading = "Figure")]
    fontsize: Option<f64>,

    /// Don't draw metabolites and reactions without flux
    #[arg(long = "hide-unused", help_heading = "Figure")]
    hide_unused: bool,

    /// Don't draw cofactor nodes of reactions without flux
    #[arg(long = "hide-unused-cofactors", help_heading = "Figure")]
    hide_unused_cofactors: bool,

    /// Opacity of reactions and metabolites without flux
    #[arg(long = "inactive-alpha", value_name = "F", help_heading = "Figure")]
    inactive_alpha: Option<f64>,

    /// SVG drawn behind the figure
    #[arg(long = "background", value_name = "FILE", help_heading = "Figure")]
    background: Option<PathBuf>,

    /// Extra CSS for the figure
    #[arg(long = "css", value_name = "FILE", help_heading = "Figure")]
    css: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct AnnotateArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// Output JSON file
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    out: PathBuf,
}

/// Model input and annotation options shared by all subcommands
#[derive(Args, Debug)]
struct ModelArgs {
    /// COBRA JSON model
    #[arg(value_name = "MODEL")]
    model: PathBuf,

    /// JSON map of reaction ids to fluxes, used as the solved state of the model
    #[arg(short = 'f', long = "fluxes", value_name = "FILE", help_heading = "Fluxes")]
    fluxes: Option<PathBuf>,

    /// JSON map of metabolite ids to carried fluxes
    #[arg(long = "metabolite-fluxes", value_name = "FILE", help_heading = "Fluxes")]
    metabolite_fluxes: Option<PathBuf>,

    /// TOML file with exclusions, cofactors, and render options
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Metabolites to hide, with or without compartment suffix
    #[arg(long = "exclude-metabolites", value_name = "ID", num_args = 1.., help_heading = "Annotation")]
    exclude_metabolites: Vec<String>,

    /// Reactions to hide
    #[arg(long = "exclude-reactions", value_name = "ID", num_args = 1.., help_heading = "Annotation")]
    exclude_reactions: Vec<String>,

    /// Compartments to hide
    #[arg(long = "exclude-compartments", value_name = "ID", num_args = 1.., help_heading = "Annotation")]
    exclude_compartments: Vec<String>,

    /// Hide the common cofactors (atp, nadh, h2o, ...) in every compartment
    #[arg(long = "exclude-common-cofactors", help_heading = "Annotation")]
    exclude_common_cofactors: bool,

    /// Metabolites drawn as separate cofactor nodes on each of their reactions
    #[arg(long = "cofactors", value_name = "ID", num_args = 1.., help_heading = "Annotation")]
    cofactors: Vec<String>,

    /// Color reactions by their NAD(P)/quinone balance
    #[arg(long = "color-redox", help_heading = "Annotation")]
    color_redox: bool,
}

/// Contents of the `--config` file
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    excluded_metabolites: Vec<String>,
    excluded_reactions: Vec<String>,
    excluded_compartments: Vec<String>,
    cofactors: Vec<String>,
    render: RenderOptions,
}

impl ConfigFile {
    fn load(path: &Path) -> Result<ConfigFile> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("unable to read config {}", path.display()))?;
        let config: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }
}

impl ModelArgs {
    /// Load the model and apply every annotation option except rendering
    fn prepare(&self) -> Result<(Model, FluxMapOptions)> {
        let mut model = Model::read_json(&self.model)
            .with_context(|| format!("unable to load model {}", self.model.display()))?;
        info!(
            reactions = model.reactions.len(),
            metabolites = model.metabolites.len(),
            "loaded model"
        );

        let config = match self.config {
            Some(ref path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };

        if let Some(ref path) = self.fluxes {
            let fluxes = read_flux_map(path)
                .with_context(|| format!("unable to load fluxes {}", path.display()))?;
            let solved = fluxes
                .into_iter()
                .filter_map(|(id, flux)| flux.map(|flux| (id, flux)))
                .collect();
            model.set_solution(Solution::optimal(solved));
        }

        let mut cofactors = config.cofactors;
        cofactors.extend(self.cofactors.iter().cloned());
        update_cofactors(&mut model, &cofactors);

        if self.color_redox {
            if model.solution.is_none() {
                warn!("--color-redox needs fluxes, no reactions will be colored");
            }
            color_redox_rxns(&mut model, &ColorRedoxOptions::default());
        }

        let mut excluded_metabolites = config.excluded_metabolites;
        excluded_metabolites.extend(self.exclude_metabolites.iter().cloned());
        if self.exclude_common_cofactors {
            excluded_metabolites.extend(COMMON_COFACTORS.iter().map(|id| id.to_string()));
        }
        let mut excluded_reactions = config.excluded_reactions;
        excluded_reactions.extend(self.exclude_reactions.iter().cloned());
        let mut excluded_compartments = config.excluded_compartments;
        excluded_compartments.extend(self.exclude_compartments.iter().cloned());

        let mut render = config.render;
        if let Some(ref path) = self.metabolite_fluxes {
            let metabolite_fluxes = read_flux_map(path)
                .with_context(|| format!("unable to load metabolite fluxes {}", path.display()))?;
            render.metabolite_dict = Some(metabolite_fluxes);
        }

        let options = FluxMapOptions {
            excluded_metabolites,
            excluded_reactions,
            excluded_compartments,
            render,
            ..FluxMapOptions::default()
        };
        Ok((model, options))
    }
}

impl RenderArgs {
    /// Render options given on the command line
    fn render_options(&self) -> Result<RenderOptions> {
        let custom_css = match self.css {
            Some(ref path) => Some(
                fs::read_to_string(path)
                    .with_context(|| format!("unable to read css {}", path.display()))?,
            ),
            None => None,
        };
        let figsize = match (self.width, self.height) {
            (Some(width), Some(height)) => Some((width, height)),
            _ => None,
        };
        Ok(RenderOptions {
            background_template: self.background.clone(),
            custom_css,
            figure_id: self.figure_id.clone(),
            hide_unused: self.hide_unused.then_some(true),
            hide_unused_cofactors: self.hide_unused_cofactors.then_some(true),
            inactive_alpha: self.inactive_alpha,
            figsize,
            fontsize: self.fontsize,
            ..RenderOptions::default()
        })
    }
}

fn render(args: &RenderArgs) -> Result<()> {
    let (mut model, mut options) = args.model.prepare()?;
    options.render = args.render_options()?.merge(options.render);
    let html = flux_map(&mut model, options)?;

    let output = if args.standalone {
        html.standalone_page()
    } else {
        html.to_string()
    };
    match args.out {
        Some(ref path) => {
            fs::write(path, output)
                .with_context(|| format!("unable to write {}", path.display()))?;
            info!(figure_id = html.figure_id(), path = %path.display(), "wrote flux map");
        }
        None => println!("{}", output),
    }
    Ok(())
}

fn annotate_model(args: &AnnotateArgs) -> Result<()> {
    let (mut model, options) = args.model.prepare()?;
    annotate(&mut model, &options);
    let render = options.render.merge(RenderOptions::from_model(&model));
    apply_fluxes(
        &mut model,
        render.flux_dict.as_ref(),
        render.metabolite_dict.as_ref(),
    );
    model
        .write_json(&args.out)
        .with_context(|| format!("unable to write {}", args.out.display()))?;
    info!(path = %args.out.display(), "wrote annotated model");
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Render(ref args) => render(args),
        Command::Annotate(ref args) => {
            if args.out == args.model.model {
                bail!("refusing to overwrite the input model, choose another --out");
            }
            annotate_model(args)
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("d3flux=info")),
        )
        .init();

    run(Cli::parse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use d3flux_core::metabolic_model::map_info::Annotated;

    fn simple_model_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("d3flux_core")
            .join("test_data")
            .join("test_models")
            .join("simple_model.json")
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("d3flux").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn parse_render_args() {
        let cli = parse(&[
            "render",
            "model.json",
            "--exclude-metabolites",
            "atp",
            "h2o",
            "--width",
            "300",
            "--height",
            "250",
            "--hide-unused",
        ]);
        let Command::Render(args) = cli.command else {
            panic!("expected render");
        };
        assert_eq!(args.model.exclude_metabolites, vec!["atp", "h2o"]);
        let options = args.render_options().unwrap();
        assert_eq!(options.figsize, Some((300, 250)));
        assert_eq!(options.hide_unused, Some(true));
        assert_eq!(options.hide_unused_cofactors, None);
    }

    #[test]
    fn width_needs_height() {
        let result = Cli::try_parse_from(["d3flux", "render", "model.json", "--width", "300"]);
        assert!(result.is_err());
    }

    #[test]
    fn config_file() {
        let config: ConfigFile = toml::from_str(
            r#"
excluded_metabolites = ["h2o", "h"]
cofactors = ["atp_c"]

[render]
figsize = [640, 480]
fontsize = 9.0
hide_unused = true
"#,
        )
        .unwrap();
        assert_eq!(config.excluded_metabolites, vec!["h2o", "h"]);
        assert_eq!(config.cofactors, vec!["atp_c"]);
        assert_eq!(config.render.figsize, Some((640, 480)));
        assert_eq!(config.render.fontsize, Some(9.0));
        assert!(toml::from_str::<ConfigFile>("excluded = []").is_err());
    }

    #[test]
    fn render_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("map.html");
        let model = simple_model_path();
        let cli = parse(&[
            "render",
            model.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "--figure-id",
            "cli_map",
            "--standalone",
        ]);
        run(cli).unwrap();
        let page = fs::read_to_string(&out).unwrap();
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains(r#"id="cli_map""#));
    }

    #[test]
    fn annotate_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let fluxes = dir.path().join("fluxes.json");
        fs::write(&fluxes, r#"{"R1": 1.0, "R5": 1.0, "R9": 1.0, "R3": 1.0}"#).unwrap();
        let out = dir.path().join("annotated.json");
        let model = simple_model_path();
        let cli = parse(&[
            "annotate",
            model.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "--fluxes",
            fluxes.to_str().unwrap(),
            "--cofactors",
            "B",
        ]);
        run(cli).unwrap();

        let annotated = Model::read_json(&out).unwrap();
        let r1 = annotated.reactions["R1"].map_info().unwrap();
        assert!(r1.is_hidden());
        assert_eq!(r1.flux, Some(1.0));
        assert_eq!(annotated.reactions["R6"].map_info().unwrap().flux, None);
        assert!(annotated.reactions["R5"].map_info().unwrap().has_cofactor("B"));
        assert_eq!(
            annotated.metabolites["B"].map_info().unwrap().display_name.as_deref(),
            Some("B")
        );
    }

    #[test]
    fn annotate_refuses_to_overwrite_input() {
        let model = simple_model_path();
        let path = model.to_str().unwrap();
        let cli = parse(&["annotate", path, "-o", path]);
        assert!(run(cli).is_err());
    }
}
