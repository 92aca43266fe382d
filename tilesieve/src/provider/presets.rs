//! Well-known tile sources.
//!
//! A preset supplies the URL template of a public tile service. Presets
//! that need an API key name the credential the template expects; the key
//! itself comes from configuration.

/// Built-in provider definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub template: &'static str,
    pub subdomains: &'static [&'static str],
    /// Credential placeholders the template uses
    pub credentials: &'static [&'static str],
}

const MAPBOX_STREETS: Preset = Preset {
    name: "mapbox-streets",
    description: "MapBox Streets v11 raster tiles",
    template: "https://api.mapbox.com/styles/v1/mapbox/streets-v11/tiles/{z}/{x}/{y}?access_token={mapbox_token}",
    subdomains: &[],
    credentials: &["mapbox_token"],
};

const MAPBOX_SATELLITE: Preset = Preset {
    name: "mapbox-satellite",
    description: "MapBox Satellite v9 raster tiles",
    template: "https://api.mapbox.com/styles/v1/mapbox/satellite-v9/tiles/{z}/{x}/{y}?access_token={mapbox_token}",
    subdomains: &[],
    credentials: &["mapbox_token"],
};

const GOOGLE_SATELLITE: Preset = Preset {
    name: "google-satellite",
    description: "Google satellite imagery",
    template: "https://khms2.google.com/kh/v=982?x={x}&y={y}&z={z}",
    subdomains: &[],
    credentials: &[],
};

const TIANDITU_VEC: Preset = Preset {
    name: "tianditu-vec",
    description: "Tianditu vector base map (Web Mercator)",
    template: "https://t4.tianditu.gov.cn/vec_w/wmts?SERVICE=WMTS&REQUEST=GetTile&VERSION=1.0.0&LAYER=vec&STYLE=default&TILEMATRIXSET=w&FORMAT=tiles&TILEMATRIX={z}&TILEROW={y}&TILECOL={x}&tk={tiandi_token}",
    subdomains: &[],
    credentials: &["tiandi_token"],
};

const TIANDITU_CVA: Preset = Preset {
    name: "tianditu-cva",
    description: "Tianditu vector annotation layer (Web Mercator)",
    template: "https://t4.tianditu.gov.cn/cva_w/wmts?SERVICE=WMTS&REQUEST=GetTile&VERSION=1.0.0&LAYER=cva&STYLE=default&TILEMATRIXSET=w&FORMAT=tiles&TILEMATRIX={z}&TILEROW={y}&TILECOL={x}&tk={tiandi_token}",
    subdomains: &[],
    credentials: &["tiandi_token"],
};

/// Every built-in preset, in display order.
pub const PRESETS: &[Preset] = &[
    MAPBOX_STREETS,
    MAPBOX_SATELLITE,
    GOOGLE_SATELLITE,
    TIANDITU_VEC,
    TIANDITU_CVA,
];

/// Looks up a preset by name.
pub fn preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name == name)
}
