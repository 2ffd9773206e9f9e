//! Built-in catalog used when no durable copy exists yet

use base64::Engine;

use crate::models::{
    CategoryDescriptor, HeroSlide, Product, ProductCategory, SiteSettings, SlideId, StockStatus,
};

pub const DEFAULT_WHATSAPP_NUMBER: &str = "971502474482";
pub const DEFAULT_ADDRESS: &str = "Deira, Gold Souk, Dubai, UAE";
pub const DEFAULT_MAP_URL: &str = "https://maps.app.goo.gl/971502474482";
pub const DEFAULT_ABOUT: &str = "Nexlyn is a premier MikroTik® Master Distributor based in Dubai, serving the Middle East and Africa. We specialize in providing carrier-grade routing, high-density switching, and professional wireless deployments for internet service providers and large-scale enterprises.";

/// Category pills in display order; "All" first.
pub const CATEGORY_DESCRIPTORS: [CategoryDescriptor; 7] = [
    CategoryDescriptor { name: "All", id: "all", icon: "Globe" },
    CategoryDescriptor { name: "Routing", id: "routing", icon: "Router" },
    CategoryDescriptor { name: "Switching", id: "switching", icon: "Grid" },
    CategoryDescriptor { name: "Wireless", id: "wireless", icon: "Wifi" },
    CategoryDescriptor { name: "5G/LTE", id: "5g", icon: "Bolt" },
    CategoryDescriptor { name: "IoT", id: "iot", icon: "Wifi" },
    CategoryDescriptor { name: "Accessories", id: "accessories", icon: "Shield" },
];

const ROUTING_SVG: &str = r##"<svg width="800" height="800" viewBox="0 0 800 800" xmlns="http://www.w3.org/2000/svg"><rect width="800" height="800" fill="#140005"/><path d="M100 300H700M100 500H700M300 100V700M500 100V700" stroke="#E60026" stroke-opacity="0.2"/><rect x="200" y="350" width="400" height="100" rx="4" fill="#E60026" fill-opacity="0.05" stroke="#E60026" stroke-width="2"/></svg>"##;
const SWITCHING_SVG: &str = r##"<svg width="800" height="800" viewBox="0 0 800 800" xmlns="http://www.w3.org/2000/svg"><rect width="800" height="800" fill="#030303"/><rect x="150" y="200" width="500" height="400" rx="8" fill="white" fill-opacity="0.05"/><path d="M180 240H620M180 280H620M180 320H620M180 360H620" stroke="white" stroke-opacity="0.1"/></svg>"##;
const WIRELESS_SVG: &str = r##"<svg width="800" height="800" viewBox="0 0 800 800" xmlns="http://www.w3.org/2000/svg"><rect width="800" height="800" fill="#030303"/><circle cx="400" cy="400" r="300" stroke="#E60026" stroke-opacity="0.1"/><circle cx="400" cy="400" r="200" stroke="#E60026" stroke-width="2" stroke-opacity="0.2"/><circle cx="400" cy="400" r="10" fill="#E60026"/></svg>"##;
const LTE_SVG: &str = r##"<svg width="800" height="800" viewBox="0 0 800 800" xmlns="http://www.w3.org/2000/svg"><rect width="800" height="800" fill="#030303"/><path d="M400 100L400 700M400 100L350 150M400 100L450 150" stroke="white" stroke-width="4" stroke-opacity="0.8"/></svg>"##;
const ACCESSORIES_SVG: &str = r##"<svg width="800" height="800" viewBox="0 0 800 800" xmlns="http://www.w3.org/2000/svg"><rect width="800" height="800" fill="#0b0b0b"/><rect x="300" y="300" width="200" height="200" fill="white" fill-opacity="0.05" stroke="white" stroke-opacity="0.2"/></svg>"##;

fn svg_data_uri(svg: &str) -> String {
    format!(
        "data:image/svg+xml;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(svg)
    )
}

/// Abstract placeholder artwork for a category.
pub fn category_visual(category: ProductCategory) -> String {
    let svg = match category {
        ProductCategory::Routing => ROUTING_SVG,
        ProductCategory::Switching => SWITCHING_SVG,
        ProductCategory::Wireless | ProductCategory::IoT => WIRELESS_SVG,
        ProductCategory::FiveGLte => LTE_SVG,
        ProductCategory::Accessories => ACCESSORIES_SVG,
    };
    svg_data_uri(svg)
}

fn product(
    id: &str,
    name: &str,
    code: &str,
    category: ProductCategory,
    specs: &[&str],
    description: &str,
    featured: bool,
) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        code: code.to_string(),
        category,
        specs: specs.iter().map(|s| s.to_string()).collect(),
        description: description.to_string(),
        image_url: category_visual(category),
        status: StockStatus::InStock,
        featured,
        youtube_url: None,
        related_products: None,
    }
}

pub fn seed_products() -> Vec<Product> {
    use ProductCategory::*;
    vec![
        product(
            "ccr2004-12s",
            "MikroTik® CCR2004-1G-12S+2XS",
            "Cloud Core Router",
            Routing,
            &["12× 10G SFP+", "2× 25G SFP28", "RouterOS v7", "AL52400 quad-core @ 2 GHz", "BGP/OSPF/MPLS"],
            "The definitive solution for ISP backbones and enterprise core routing. Features phenomenal single-core performance.",
            true,
        ),
        product(
            "hap-ax3",
            "MikroTik® hAP ax³",
            "Home Access Point",
            Wireless,
            &["Wi-Fi 6 (802.11ax)", "2.5 Gigabit Ethernet", "Triple-chain 5 GHz", "PoE-in/out", "IPsec acceleration"],
            "Our top-of-the-line home/small office access point. Blazing fast wireless with the most advanced security features.",
            true,
        ),
        product(
            "rb5009",
            "MikroTik® RB5009UG+S+IN",
            "RouterBOARD",
            Routing,
            &["7× Gigabit Ethernet", "1× 2.5G Ethernet", "1× 10G SFP+", "ARM quad-core @ 1.4 GHz", "1GB RAM"],
            "The ultimate heavy-duty home lab router. Seven times faster than the previous generation with versatile power options.",
            false,
        ),
        product(
            "crs518",
            "MikroTik® CRS518-16XS-2XQ-RM",
            "Cloud Router Switch",
            Switching,
            &["16× 10G SFP+", "2× 100G QSFP28", "Hot-swap PSU", "Quad-core 2 GHz", "SwOS/RouterOS"],
            "High-density fiber switching for data centers and enterprise backbones. 100G capacity on every core port.",
            true,
        ),
        product(
            "crs326",
            "MikroTik® CRS326-24G-2S+RM",
            "Cloud Router Switch",
            Switching,
            &["24× Gigabit Ethernet", "2× 10G SFP+ uplinks", "Rackmount 1U", "PoE available", "L3 routing"],
            "Reliable access layer switching with wire-speed performance and RouterOS L3 capabilities.",
            false,
        ),
        product(
            "css610",
            "MikroTik® CSS610-8G-2S+IN",
            "Cloud Smart Switch",
            Switching,
            &["8× Gigabit Ethernet", "2× 10G SFP+", "SwOS", "Low power", "Fanless"],
            "Compact 10G aggregation for small businesses. Silent, efficient, and professional.",
            false,
        ),
        product(
            "audience-ax",
            "MikroTik® Audience Wi-Fi 6",
            "Access Point",
            Wireless,
            &["Wi-Fi 6", "Tri-radio Mesh", "4×4 MIMO on 5 GHz", "2.5G uplink", "PoE 802.3at"],
            "Stylish tri-band mesh solution for high-density environments like hotels, conferences, and modern offices.",
            false,
        ),
        product(
            "wap-ax",
            "MikroTik® wAP ax",
            "Wireless Access Point",
            Wireless,
            &["Wi-Fi 6 dual-concurrent", "Weatherproof IP54", "PoE 802.3af/at", "Integrated antennas"],
            "Rugged, weatherproof outdoor access point. Perfect for campus networks, warehouses, and mobile deployments.",
            false,
        ),
        product(
            "lhg-5-ac",
            "MikroTik® LHG 5 ac",
            "Light Head Grid",
            Wireless,
            &["5 GHz 802.11ac", "24.5 dBi antenna", "PtP up to 10 km", "Weatherproof", "RouterOS L3"],
            "The standard for point-to-point wireless links. Grid design offers unmatched wind protection for high-altitude installs.",
            false,
        ),
        product(
            "chateau-5g-ax",
            "MikroTik® Chateau 5G ax",
            "5G Router",
            FiveGLte,
            &["5G NR R16 modem", "Wi-Fi 6 dual-band", "2.5 Gigabit Ethernet", "eSIM + nano SIM"],
            "Carrier-grade 5G connectivity for home and enterprise. Features advanced carrier aggregation and high-gain antennas.",
            false,
        ),
        product(
            "ltap-lte",
            "MikroTik® LtAP LTE kit",
            "LTE Access Point",
            FiveGLte,
            &["LTE Cat 4", "Dual-SIM failover", "Wi-Fi 2.4/5 GHz", "GPS", "Weatherproof IP67"],
            "Industrial-grade mobile gateway for vehicles and remote IoT deployments with GPS and triple SIM slots.",
            false,
        ),
        product(
            "s-rj10",
            "MikroTik® S+RJ10",
            "SFP+ Module",
            Accessories,
            &["10GBASE-T copper SFP+", "RJ45 Connector", "100m on Cat6a", "Low power consumption"],
            "Transform your SFP+ ports into 10G copper ports. Supports 6 speeds for maximum hardware compatibility.",
            false,
        ),
    ]
}

fn slide(id: &str, title: &str, subtitle: &str, category: ProductCategory) -> HeroSlide {
    HeroSlide {
        id: SlideId(id.to_string()),
        title: title.to_string(),
        subtitle: subtitle.to_string(),
        image: category_visual(category),
        category_id: Some(category.as_str().to_string()),
    }
}

pub fn seed_hero_slides() -> Vec<HeroSlide> {
    use ProductCategory::*;
    vec![
        slide(
            "slide-1",
            "OFFICIAL MIKROTIK® MASTER DISTRIBUTOR.",
            "NEXLYN Distribution LLC: Your authorized source for genuine network infrastructure in the MENA region.",
            Routing,
        ),
        slide(
            "slide-2",
            "ENTERPRISE-GRADE INFRASTRUCTURE.",
            "Deploy 100G carrier-grade hardware for data centers, ISPs, and large-scale enterprise environments.",
            Switching,
        ),
        slide(
            "slide-3",
            "B2B DISTRIBUTION EXCELLENCE.",
            "Tiered volume pricing and technical logistics for authorized resellers and system integrators.",
            Wireless,
        ),
        slide(
            "slide-4",
            "NEXT-GEN 5G CONNECTIVITY.",
            "High-speed LTE and 5G NR hardware for mission-critical mobile and remote networking deployments.",
            FiveGLte,
        ),
        slide(
            "slide-5",
            "PROFESSIONAL NETWORK ACCESSORIES.",
            "SFP+ modules, high-gain antennas, and specialized technical accessories for complete build-outs.",
            Accessories,
        ),
    ]
}

pub fn default_settings() -> SiteSettings {
    SiteSettings {
        whatsapp_number: DEFAULT_WHATSAPP_NUMBER.to_string(),
        about: DEFAULT_ABOUT.to_string(),
        address: DEFAULT_ADDRESS.to_string(),
        map_url: DEFAULT_MAP_URL.to_string(),
    }
}
