//! Single-page view: status log, map, sensor data, dispatch form.
//!
//! The page is rendered server-side as one HTML document. The map is a
//! Leaflet widget centered on the resolved coordinate with a single marker.
//! Rendering is a pure function of its inputs.

use crate::core::{
    logs::{LogEntry, LogLevel},
    reading::ResolvedReading,
};

const PAGE_TITLE: &str = "Smart Parking Tracker";
const MAP_ZOOM: u32 = 15;
const MARKER_POPUP: &str = "Your Location";

/// Render the full page for the resolved reading, the current status log
/// and the last-entered endpoint.
pub fn render_page(view: &ResolvedReading, entries: &[LogEntry], endpoint: &str) -> String {
    let reading = &view.reading;
    let mut page = String::with_capacity(8 * 1024);

    page.push_str("<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\"/>\n");
    page.push_str(&format!("<title>{PAGE_TITLE}</title>\n"));
    page.push_str(
        "<link rel=\"stylesheet\" href=\"https://unpkg.com/leaflet@1.9.4/dist/leaflet.css\"/>\n\
         <script src=\"https://unpkg.com/leaflet@1.9.4/dist/leaflet.js\"></script>\n",
    );
    page.push_str(
        "<style>\n\
         body { font-family: sans-serif; margin: 2rem auto; max-width: 760px; }\n\
         #map { height: 500px; margin: 1rem 0; }\n\
         .log { background: #f5f5f5; padding: 0.5rem 1rem; font-size: 0.9rem; }\n\
         .log .warning { color: #a15c00; }\n\
         .log .error { color: #b00020; }\n\
         .banner { background: #fff3cd; padding: 0.75rem 1rem; border: 1px solid #ffe08a; }\n\
         </style>\n</head>\n<body>\n",
    );
    page.push_str(&format!("<h1>{PAGE_TITLE}</h1>\n"));

    render_status_log(&mut page, entries);

    if view.fallback {
        page.push_str(&format!(
            "<p class=\"banner\">Error fetching GPS data. Using default coordinates \
             ({}, {}).</p>\n",
            reading.latitude, reading.longitude
        ));
    } else {
        page.push_str(&format!(
            "<p>Current location: latitude {}, longitude {}</p>\n",
            reading.latitude, reading.longitude
        ));
    }

    page.push_str("<h2>Map View of Your Location</h2>\n<div id=\"map\"></div>\n");
    page.push_str(&format!(
        "<script>\n\
         var map = L.map('map').setView([{lat}, {lon}], {MAP_ZOOM});\n\
         L.tileLayer('https://tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{\n\
           attribution: '&copy; OpenStreetMap contributors'\n\
         }}).addTo(map);\n\
         L.marker([{lat}, {lon}]).bindPopup('{MARKER_POPUP}').addTo(map);\n\
         </script>\n",
        lat = reading.latitude,
        lon = reading.longitude,
    ));

    page.push_str("<h2>Sensor Data</h2>\n<ul>\n");
    for (index, distance) in reading.distances().iter().enumerate() {
        page.push_str(&format!(
            "<li>Distance from sensor {}: {distance} cm</li>\n",
            index + 1
        ));
    }
    page.push_str("</ul>\n");

    page.push_str(&format!(
        "<h2>Send Data to IoT System</h2>\n\
         <form method=\"post\" action=\"/dispatch\">\n\
         <label>IoT endpoint URL:\n\
         <input type=\"text\" name=\"endpoint\" size=\"60\" value=\"{}\"/></label>\n\
         <button type=\"submit\">Send location and data</button>\n\
         </form>\n",
        html_escape(endpoint)
    ));

    page.push_str("</body>\n</html>\n");
    page
}

fn render_status_log(page: &mut String, entries: &[LogEntry]) {
    page.push_str("<div class=\"log\">\n");
    if entries.is_empty() {
        page.push_str("<p>No status messages.</p>\n");
    }
    for entry in entries {
        let class = match entry.level {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        };
        page.push_str(&format!(
            "<p class=\"{class}\">{} {}</p>\n",
            entry.timestamp.format("%H:%M:%S"),
            html_escape(&entry.message)
        ));
    }
    page.push_str("</div>\n");
}

/// Minimal HTML escaping for operator-provided text (raw serial lines, the
/// endpoint input, response bodies).
pub fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
