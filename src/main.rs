/// Terminal front end for the yview engine.
///
/// Usage: `yview <image_dir> [label_dir] [--config <file>]`
///
/// Reads one command per line from stdin and prints every rendered frame.
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(e) = native::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::io::BufRead;
    use std::path::PathBuf;

    use web_time::Instant;
    use yview::config::ConfigError;
    use yview::{Frame, Viewer, ViewerConfig};

    const HELP: &str = "\
commands:
  n / p          next / previous image
  N / P          forward / back 10 images
  g <number>     go to image number (1-based)
  j <name>       jump to image by name
  scrub <number> drag the slider to image number
  b / s / l      toggle boxes / segments / labels
  a <alpha>      segment fill opacity (0-1)
  label <id> <name>
  unlabel <id>
  coverage       label file coverage
  q              quit";

    struct Args {
        image_dir: PathBuf,
        label_dir: Option<PathBuf>,
        config: Option<PathBuf>,
    }

    fn parse_args() -> Result<Args, String> {
        let mut positional = Vec::new();
        let mut config = None;
        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            if arg == "--config" {
                config = Some(PathBuf::from(args.next().ok_or("--config needs a file")?));
            } else {
                positional.push(PathBuf::from(arg));
            }
        }

        let mut positional = positional.into_iter();
        let image_dir = positional
            .next()
            .ok_or("usage: yview <image_dir> [label_dir] [--config <file>]")?;
        Ok(Args {
            image_dir,
            label_dir: positional.next(),
            config,
        })
    }

    /// Where the configuration came from, reported once logging is up.
    enum ConfigSource {
        Defaults,
        File(PathBuf),
        Unreadable(PathBuf, ConfigError),
    }

    /// Load `--config` if given, else the default file if it exists.
    ///
    /// Only an explicit file that fails to load is an error.
    fn load_config(path: Option<&PathBuf>) -> Result<(ViewerConfig, ConfigSource), ConfigError> {
        if let Some(path) = path {
            let config = ViewerConfig::load(path)?;
            return Ok((config, ConfigSource::File(path.clone())));
        }

        let Some(path) = ViewerConfig::default_path().filter(|p| p.exists()) else {
            return Ok((ViewerConfig::default(), ConfigSource::Defaults));
        };
        match ViewerConfig::load(&path) {
            Ok(config) => Ok((config, ConfigSource::File(path))),
            Err(e) => Ok((ViewerConfig::default(), ConfigSource::Unreadable(path, e))),
        }
    }

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        let args = parse_args()?;
        let (config, source) = load_config(args.config.as_ref())?;

        env_logger::Builder::new()
            .filter_level(config.log_level.to_level_filter())
            .parse_default_env()
            .init();

        match source {
            ConfigSource::Defaults => log::debug!("No config file found, using defaults"),
            ConfigSource::File(path) => log::info!("Loaded configuration from {:?}", path),
            ConfigSource::Unreadable(path, e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e)
            }
        }

        let mut viewer = Viewer::new(&config);
        let frame = viewer.open_folder(&args.image_dir)?;
        match &args.label_dir {
            Some(label_dir) => print_frame(viewer.set_label_dir(label_dir)),
            None => print_frame(frame),
        }

        if let Some(coverage) = viewer.label_coverage().filter(|c| !c.is_complete()) {
            println!(
                "warning: {} of {} images have no label file",
                coverage.missing(),
                coverage.total
            );
        }
        println!("{}", HELP);

        for line in std::io::stdin().lock().lines() {
            let line = line?;
            let mut words = line.split_whitespace();
            let Some(command) = words.next() else {
                continue;
            };
            let rest: Vec<&str> = words.collect();

            let frame = match (command, rest.as_slice()) {
                ("q", _) => break,
                ("n", _) => viewer.next_image(),
                ("p", _) => viewer.prev_image(),
                ("N", _) => viewer.next_page(),
                ("P", _) => viewer.prev_page(),
                ("g", [number]) => match number.parse::<usize>() {
                    Ok(n) => viewer.jump_to(n.saturating_sub(1)),
                    Err(_) => {
                        println!("not a number: {}", number);
                        None
                    }
                },
                ("j", [name]) => {
                    let frame = viewer.jump_to_name(name);
                    if frame.is_none() {
                        println!("image not found: {}", name);
                    }
                    frame
                }
                ("scrub", [number]) => match number.parse::<usize>() {
                    Ok(n) => scrub(&mut viewer, n.saturating_sub(1)),
                    Err(_) => {
                        println!("not a number: {}", number);
                        None
                    }
                },
                ("b", _) => {
                    viewer.toggle_boxes(Instant::now());
                    settle(&mut viewer)
                }
                ("s", _) => {
                    viewer.toggle_segments(Instant::now());
                    settle(&mut viewer)
                }
                ("l", _) => {
                    viewer.toggle_labels(Instant::now());
                    settle(&mut viewer)
                }
                ("a", [alpha]) => match alpha.parse::<f32>() {
                    Ok(alpha) => {
                        viewer.set_segment_alpha(alpha, Instant::now());
                        settle(&mut viewer)
                    }
                    Err(_) => {
                        println!("not a number: {}", alpha);
                        None
                    }
                },
                ("label", [id, name @ ..]) if !name.is_empty() => match id.parse() {
                    Ok(id) => {
                        viewer.set_label(id, name.join(" "), Instant::now());
                        settle(&mut viewer)
                    }
                    Err(_) => {
                        println!("not a class id: {}", id);
                        None
                    }
                },
                ("unlabel", [id]) => match id.parse() {
                    Ok(id) => {
                        viewer.remove_label(id, Instant::now());
                        settle(&mut viewer)
                    }
                    Err(_) => {
                        println!("not a class id: {}", id);
                        None
                    }
                },
                ("coverage", _) => {
                    match viewer.label_coverage() {
                        Some(c) => println!(
                            "labeled {}/{} ({:.1}%), missing {}",
                            c.labeled,
                            c.total,
                            c.percent(),
                            c.missing()
                        ),
                        None => println!("no label folder"),
                    }
                    None
                }
                _ => {
                    println!("{}", HELP);
                    None
                }
            };
            print_frame(frame);
        }

        Ok(())
    }

    /// Drag the slider one image at a time to `target`, printing previews.
    fn scrub(viewer: &mut Viewer, target: usize) -> Option<Frame> {
        let start = viewer.current_index();
        let target = target.min(viewer.sequence().len().saturating_sub(1));
        viewer.drag_start();
        let path: Vec<usize> = if target >= start {
            (start..=target).collect()
        } else {
            (target..=start).rev().collect()
        };
        for index in path {
            print_frame(viewer.drag_move(index, Instant::now()));
        }
        viewer.drag_end()
    }

    /// Block until the deferred render fires.
    fn settle(viewer: &mut Viewer) -> Option<Frame> {
        while let Some(deadline) = viewer.scheduler().pending_deadline() {
            let now = Instant::now();
            if now < deadline {
                std::thread::sleep(deadline - now);
            }
            if let Some(frame) = viewer.tick(Instant::now()) {
                return Some(frame);
            }
        }
        None
    }

    fn print_frame(frame: Option<Frame>) {
        match frame {
            Some(Frame::Rendered(frame)) => {
                println!("{}", frame.title());
                println!("{}", frame.info_text());
                println!("overlays: {}", frame.overlay_count());
            }
            Some(Frame::Unavailable { path, reason, .. }) => {
                println!("unavailable: {:?} ({})", path, reason);
            }
            None => {}
        }
    }

}
