// src/display/terminal.rs
//! Terminal-based map host

use super::RenderSurface;
use crate::{
    error::{MapError, Result},
    lifecycle::LifecycleEvent,
    map::{lat_lon_to_tile, StyleDocument, TileId, TileSource},
    screen::MapScreen,
};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType, DisableLineWrap, EnableLineWrap},
};
use std::{
    io::{self, Write},
    time::Duration,
};
use tokio::time::interval;
use tracing::debug;

/// Draws the map screen as a status page
#[derive(Debug, Default)]
pub struct TerminalSurface {
    tiles: Option<TileSource>,
    style_name: Option<String>,
    last_event: Option<LifecycleEvent>,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_event(&self) -> Option<LifecycleEvent> {
        self.last_event
    }

    /// Tile endpoint of the loaded style, if any
    pub fn tiles(&self) -> Option<&TileSource> {
        self.tiles.as_ref()
    }
}

impl RenderSurface for TerminalSurface {
    fn on_lifecycle(&mut self, event: LifecycleEvent) {
        self.last_event = Some(event);
        if event == LifecycleEvent::Destroy {
            self.tiles = None;
            self.style_name = None;
        }
    }

    fn load_style(&mut self, style: &StyleDocument) -> Result<()> {
        style.validate()?;
        self.tiles = Some(TileSource::from_style(style)?);
        self.style_name = Some(style.name.clone());
        Ok(())
    }
}

/// Drive the screen until Ctrl+C, redrawing once a second
pub async fn run(mut screen: MapScreen<TerminalSurface>) -> Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, Hide, DisableLineWrap)?;

    screen.handle_lifecycle(LifecycleEvent::Start);
    screen.handle_lifecycle(LifecycleEvent::Resume);

    let mut ticker = interval(Duration::from_secs(1));
    let result = loop {
        tokio::select! {
            _ = ticker.tick() => {
                let applied = screen.pump();
                debug!(applied, "map tasks applied");

                let drawn = execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))
                    .map_err(MapError::from)
                    .and_then(|_| render(&mut stdout, &screen))
                    .and_then(|_| stdout.flush().map_err(MapError::from));
                if let Err(e) = drawn {
                    break Err(e);
                }
            }
            signal = tokio::signal::ctrl_c() => {
                break signal.map_err(MapError::from);
            }
        }
    };

    screen.shutdown();
    execute!(stdout, Show, EnableLineWrap)?;
    println!("\nShutting down...");
    result
}

/// Render the screen state
pub fn render(out: &mut impl Write, screen: &MapScreen<TerminalSurface>) -> Result<()> {
    let surface = screen.surface();
    let backend = surface.renderer();

    execute!(
        out,
        SetForegroundColor(Color::Green),
        Print("=".repeat(60)),
        Print("\n"),
        Print("Cycle Map - OpenCycleMap with live position"),
        Print("\n"),
        Print("=".repeat(60)),
        Print("\n"),
        ResetColor
    )?;

    let style = backend.style_name.as_deref().unwrap_or("none");
    let event = backend
        .last_event
        .map_or_else(|| "none".to_string(), |e| e.to_string());
    execute!(
        out,
        Print(format!("Style:     {} ({:?})\n", style, surface.state())),
        Print(format!("Lifecycle: {}\n\n", event))
    )?;

    // Camera
    let camera = surface.camera();
    execute!(
        out,
        SetForegroundColor(Color::Yellow),
        Print("CAMERA:\n"),
        ResetColor,
        Print(format!("  Target:    {}\n", camera.target)),
        Print(format!("  Zoom:      {:.1}\n", camera.zoom)),
        Print(format!(
            "  Centered:  {}\n",
            if surface.is_centered() { "yes" } else { "waiting for first fix" }
        ))
    )?;

    if let Some(tiles) = &backend.tiles {
        let zoom = camera.zoom.floor() as u8;
        let (x, y) = lat_lon_to_tile(camera.target.latitude, camera.target.longitude, zoom);
        execute!(out, Print(format!("  Tile:      {}\n", tiles.redacted_url(TileId::new(zoom, x, y)))))?;
        if let Some(attribution) = tiles.attribution() {
            execute!(out, Print(format!("  Data:      {}\n", attribution)))?;
        }
    }
    execute!(out, Print("\n"))?;

    // Marker
    let marker = match surface.marker_position() {
        Some(position) if surface.is_centered() => position.to_string(),
        Some(_) => "no fix yet".to_string(),
        None => "not on map".to_string(),
    };
    let start = screen.bridge_start();
    execute!(
        out,
        SetForegroundColor(Color::Cyan),
        Print("YOU ARE HERE:\n"),
        ResetColor,
        Print(format!("  Marker:    {}\n", marker)),
        Print(format!("  Providers: {}\n", kinds(&start.subscribed)))
    )?;
    if !start.failed.is_empty() {
        execute!(
            out,
            SetForegroundColor(Color::Red),
            Print(format!("  Failed:    {}\n", kinds(&start.failed))),
            ResetColor
        )?;
    }

    execute!(
        out,
        Print("\n"),
        SetForegroundColor(Color::Green),
        Print("=".repeat(60)),
        Print("\n"),
        Print("Press Ctrl+C to exit"),
        Print("\n"),
        ResetColor
    )?;

    Ok(())
}

fn kinds(kinds: &[crate::location::ProviderKind]) -> String {
    if kinds.is_empty() {
        return "none".to_string();
    }
    kinds.iter().map(|k| k.name()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{mock::MockProvider, Grants, LocationBridge, ProviderKind, UpdateRequest};
    use std::sync::Arc;

    fn rendered(screen: &MapScreen<TerminalSurface>) -> String {
        let mut out = Vec::new();
        render(&mut out, screen).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_render_before_and_after_fix() {
        let gps = MockProvider::new(ProviderKind::Gps);
        let bridge =
            LocationBridge::new(Arc::new(Grants::new(true, true)), UpdateRequest::default()).with_provider(gps.clone());
        let mut screen =
            MapScreen::new(TerminalSurface::new(), StyleDocument::open_cycle_map("secret"), bridge).unwrap();
        screen.pump();

        let page = rendered(&screen);
        assert!(page.contains("waiting for first fix"));
        assert!(page.contains("no fix yet"));
        assert!(page.contains("Providers: gps"));

        gps.emit(52.52, 13.405);
        screen.pump();

        let page = rendered(&screen);
        assert!(page.contains("Zoom:      15.0"));
        assert!(page.contains("/15/17604/10746.png"));
        assert!(!page.contains("secret"));
    }

    #[test]
    fn test_destroy_releases_tiles() {
        let mut surface = TerminalSurface::new();
        surface.load_style(&StyleDocument::open_cycle_map("key")).unwrap();
        assert!(surface.tiles().is_some());

        surface.on_lifecycle(LifecycleEvent::Destroy);

        assert!(surface.tiles().is_none());
        assert_eq!(surface.last_event(), Some(LifecycleEvent::Destroy));
    }
}
