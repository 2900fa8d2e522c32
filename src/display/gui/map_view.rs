// src/display/gui/map_view.rs
//! Map painting and pan/zoom gestures

use super::surface::EguiSurface;
use crate::map::{
    projection::{lat_lon_to_world, TILE_SIZE},
    style::{CirclePaint, LayerKind, Source},
    CameraPosition, MapSurface, StyleDocument, TileId,
};
use eframe::egui;

/// Scroll distance that changes the zoom by one level
const SCROLL_PER_ZOOM: f32 = 240.0;

/// Circle to draw: world position at the camera zoom and its paint
struct Circle {
    world: (f64, f64),
    paint: CirclePaint,
}

pub fn show(ui: &mut egui::Ui, surface: &mut MapSurface<EguiSurface>) {
    let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::drag());
    let rect = response.rect;

    if response.dragged() {
        let delta = response.drag_delta();
        surface.pan_by(delta.x as f64, delta.y as f64);
    }
    if response.hovered() {
        let scroll = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll != 0.0 {
            surface.zoom_by((scroll / SCROLL_PER_ZOOM) as f64);
        }
    }

    painter.rect_filled(rect, 0.0, egui::Color32::from_gray(230));

    let camera = surface.camera();
    let circles = surface.style().map(|style| circles(style, camera)).unwrap_or_default();

    paint_tiles(ui.ctx(), &painter, rect, camera, surface.renderer_mut());

    let (cx, cy) = lat_lon_to_world(camera.target.latitude, camera.target.longitude, camera.zoom);
    for circle in circles {
        let pos = rect.center() + egui::vec2((circle.world.0 - cx) as f32, (circle.world.1 - cy) as f32);
        if !rect.expand(circle.paint.radius).contains(pos) {
            continue;
        }
        painter.circle_filled(pos, circle.paint.radius, parse_color(&circle.paint.color));
        if circle.paint.stroke_width > 0.0 {
            painter.circle_stroke(
                pos,
                circle.paint.radius,
                egui::Stroke::new(circle.paint.stroke_width, parse_color(&circle.paint.stroke_color)),
            );
        }
    }
}

fn paint_tiles(
    ctx: &egui::Context,
    painter: &egui::Painter,
    rect: egui::Rect,
    camera: CameraPosition,
    backend: &mut EguiSurface,
) {
    let zoom = camera.zoom.floor();
    let scale = 2_f64.powf(camera.zoom - zoom);
    let tile_px = TILE_SIZE * scale;
    let (cx, cy) = lat_lon_to_world(camera.target.latitude, camera.target.longitude, zoom);

    // World pixel under the top-left corner of the view, at the tile zoom
    let left = cx - rect.width() as f64 / 2.0 / scale;
    let top = cy - rect.height() as f64 / 2.0 / scale;
    let first_x = (left / TILE_SIZE).floor() as i64;
    let first_y = (top / TILE_SIZE).floor() as i64;
    let count_x = (rect.width() as f64 / tile_px).ceil() as i64 + 1;
    let count_y = (rect.height() as f64 / tile_px).ceil() as i64 + 1;

    let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
    for ty in first_y..first_y + count_y {
        for tx in first_x..first_x + count_x {
            let Some(tile) = TileId::wrapped(zoom as u8, tx, ty) else {
                continue;
            };
            let min = egui::pos2(
                rect.left() + ((tx as f64 * TILE_SIZE - left) * scale) as f32,
                rect.top() + ((ty as f64 * TILE_SIZE - top) * scale) as f32,
            );
            let tile_rect = egui::Rect::from_min_size(min, egui::vec2(tile_px as f32, tile_px as f32));

            match backend.tile_texture(ctx, tile) {
                Some(texture) => painter.image(texture.id(), tile_rect, uv, egui::Color32::WHITE),
                None => {
                    let label = if backend.has_failed(tile) { "Unavailable" } else { "Loading..." };
                    painter.rect_stroke(tile_rect, 0.0, egui::Stroke::new(1.0, egui::Color32::from_gray(210)));
                    painter.text(
                        tile_rect.center(),
                        egui::Align2::CENTER_CENTER,
                        label,
                        egui::FontId::proportional(12.0),
                        egui::Color32::GRAY,
                    );
                }
            }
        }
    }
}

/// Point features of every circle layer, projected at the camera zoom
fn circles(style: &StyleDocument, camera: CameraPosition) -> Vec<Circle> {
    style
        .layers
        .iter()
        .filter_map(|layer| match (&layer.kind, style.source(&layer.source)) {
            (LayerKind::Circle { paint }, Some(Source::GeoJson { data })) => {
                let (lat, lon) = data.lat_lon();
                Some(Circle {
                    world: lat_lon_to_world(lat, lon, camera.zoom),
                    paint: paint.clone(),
                })
            }
            _ => None,
        })
        .collect()
}

/// Parse `#RRGGBB` or `#RRGGBBAA`; anything else draws black
pub fn parse_color(value: &str) -> egui::Color32 {
    let hex = value.trim_start_matches('#');
    let channel = |i: usize| hex.get(i..i + 2).and_then(|c| u8::from_str_radix(c, 16).ok());

    match (hex.len(), channel(0), channel(2), channel(4)) {
        (6, Some(r), Some(g), Some(b)) => egui::Color32::from_rgb(r, g, b),
        (8, Some(r), Some(g), Some(b)) => {
            egui::Color32::from_rgba_unmultiplied(r, g, b, channel(6).unwrap_or(255))
        }
        _ => egui::Color32::BLACK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{camera::LatLng, style::HERE_LAYER_ID, style::Geometry, style::Layer};

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#2196F3"), egui::Color32::from_rgb(0x21, 0x96, 0xF3));
        assert_eq!(parse_color("#FFFFFF"), egui::Color32::WHITE);
        assert_eq!(parse_color("blue"), egui::Color32::BLACK);
    }

    #[test]
    fn test_circles_follow_geojson_sources() {
        let mut style = StyleDocument::open_cycle_map("key");
        style.add_source("here-src", Source::GeoJson { data: Geometry::point(48.1, 11.5) });
        style.add_layer(Layer::circle(HERE_LAYER_ID, "here-src", CirclePaint::here_marker()));
        let camera = CameraPosition {
            target: LatLng::new(48.1, 11.5),
            zoom: 15.0,
        };

        let circles = circles(&style, camera);

        assert_eq!(circles.len(), 1);
        assert_eq!(circles[0].world, lat_lon_to_world(48.1, 11.5, 15.0));
        assert_eq!(circles[0].paint.radius, 6.0);
    }
}
