use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use stardream::{
    DirImageStore, DirSink, EditorSession, ExportOpts, ImageId, ImageStore as _,
    JsonFileSettingsStore, PosterSpec, SessionOpts, SettingsStore as _, SlotId, Vec2,
    ViewportOpts, load_for_migration, migrate_document,
};

#[derive(Parser, Debug)]
#[command(name = "stardream", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Copy image files into the image store and print their ids.
    Import(ImportArgs),
    /// List stored images with their metadata.
    List(StoreArgs),
    /// Put an image into a slot (or clear it) in the settings document.
    Assign(AssignArgs),
    /// Render the interactive view to a PNG.
    Preview(PreviewArgs),
    /// Export the poster at print resolution.
    Export(ExportArgs),
    /// Load a settings document through migration and print the result.
    Migrate(MigrateArgs),
}

#[derive(Parser, Debug)]
struct StoreArgs {
    /// Image store directory.
    #[arg(long, default_value = "stardream-data/images")]
    store: PathBuf,
}

#[derive(Parser, Debug)]
struct ImportArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Image files to import.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct DocumentArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Settings document (JSON).
    #[arg(long, default_value = "stardream-data/settings.json")]
    settings: PathBuf,

    /// Logical poster width.
    #[arg(long, default_value_t = 1800)]
    poster_width: u32,

    /// Logical poster height.
    #[arg(long, default_value_t = 2400)]
    poster_height: u32,
}

#[derive(Parser, Debug)]
struct AssignArgs {
    #[command(flatten)]
    doc: DocumentArgs,

    /// `core` or `dream-<n>`.
    #[arg(long)]
    slot: SlotId,

    /// Image id; omit to clear the slot.
    #[arg(long)]
    image: Option<String>,

    #[arg(long)]
    zoom: Option<f64>,

    #[arg(long)]
    size: Option<f64>,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    #[command(flatten)]
    doc: DocumentArgs,

    /// Viewport width, including the sidebar.
    #[arg(long, default_value_t = 1280.0)]
    viewport_width: f64,

    /// Viewport height.
    #[arg(long, default_value_t = 900.0)]
    viewport_height: f64,

    /// Slot to draw selection rings around.
    #[arg(long)]
    select: Option<SlotId>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    #[command(flatten)]
    doc: DocumentArgs,

    /// Directory the PNG is written into.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// File name of the exported PNG.
    #[arg(long, default_value = stardream::DEFAULT_EXPORT_FILENAME)]
    filename: String,

    #[arg(long, default_value_t = stardream::EXPORT_WIDTH)]
    width: u32,

    #[arg(long, default_value_t = stardream::EXPORT_HEIGHT)]
    height: u32,
}

#[derive(Parser, Debug)]
struct MigrateArgs {
    /// Settings document (JSON).
    #[arg(long)]
    settings: PathBuf,

    /// Write the migrated document back.
    #[arg(long)]
    write: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Import(args) => cmd_import(args),
        Command::List(args) => cmd_list(args),
        Command::Assign(args) => cmd_assign(args),
        Command::Preview(args) => cmd_preview(args),
        Command::Export(args) => cmd_export(args),
        Command::Migrate(args) => cmd_migrate(args),
    }
}

fn open_session(doc: &DocumentArgs, export: ExportOpts, out_dir: PathBuf) -> anyhow::Result<EditorSession> {
    let poster = PosterSpec::new(doc.poster_width, doc.poster_height)?;
    let images = DirImageStore::open(&doc.store.store)?;
    let opts = SessionOpts {
        poster,
        export,
        viewport: ViewportOpts::default(),
        ..SessionOpts::default()
    };
    Ok(EditorSession::new(
        opts,
        Box::new(images),
        Box::new(JsonFileSettingsStore::new(&doc.settings)),
        Box::new(DirSink::new(out_dir)),
    ))
}

fn cmd_import(args: ImportArgs) -> anyhow::Result<()> {
    let mut store = DirImageStore::open(&args.store.store)?;
    for path in &args.files {
        let bytes = std::fs::read(path).with_context(|| format!("read '{}'", path.display()))?;
        stardream::decode_image(&bytes).with_context(|| format!("decode '{}'", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id = store.save(&bytes, &name)?;
        println!("{id}  {name}");
    }
    Ok(())
}

fn cmd_list(args: StoreArgs) -> anyhow::Result<()> {
    let store = DirImageStore::open(&args.store)?;
    for id in store.list()? {
        match store.metadata(&id)? {
            Some(meta) => println!("{id}  {:>10}  {}", meta.size, meta.original_name),
            None => println!("{id}"),
        }
    }
    Ok(())
}

fn cmd_assign(args: AssignArgs) -> anyhow::Result<()> {
    let mut session = open_session(&args.doc, ExportOpts::default(), PathBuf::from("."))?;
    let image = args.image.map(ImageId::new);
    if let Some(id) = &image
        && session.images().load(id)?.is_none()
    {
        anyhow::bail!("image '{id}' is not in the store");
    }
    session.update_slot(args.slot, |slot| {
        slot.image = image;
        if let Some(z) = args.zoom {
            slot.zoom = z;
        }
        if let Some(s) = args.size {
            slot.size = s;
        }
        *slot = slot.clamped();
    })?;
    session.flush_settings()?;
    eprintln!("updated {} in {}", args.slot, args.doc.settings.display());
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let mut session = open_session(&args.doc, ExportOpts::default(), PathBuf::from("."))?;
    session.resize(Vec2::new(args.viewport_width, args.viewport_height));
    session.select(args.select);
    session.resolve_textures();
    let frame = session.render_frame()?;
    let png = frame.encode_png()?;
    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, png).with_context(|| format!("write '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let export = ExportOpts {
        width: args.width,
        height: args.height,
    };
    let mut session = open_session(&args.doc, export, args.out_dir)?;
    session.resolve_textures();
    let report = session.trigger_export(&args.filename)?;
    eprintln!(
        "wrote {} ({}x{}, {} bytes)",
        report.location, report.width, report.height, report.bytes
    );
    Ok(())
}

fn cmd_migrate(args: MigrateArgs) -> anyhow::Result<()> {
    let mut store = JsonFileSettingsStore::new(&args.settings);
    let value = load_for_migration(&store)?;
    let migrated = migrate_document(value.as_ref());
    for field in &migrated.backfilled {
        eprintln!("backfilled {field}");
    }
    for fix in &migrated.repaired {
        eprintln!("repaired {fix}");
    }
    println!("{}", migrated.document.to_json_string_pretty()?);
    if args.write {
        store.save(&migrated.document)?;
        eprintln!("wrote {}", args.settings.display());
    }
    Ok(())
}
