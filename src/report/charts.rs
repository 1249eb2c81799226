//! Standalone SVG charts. Each function returns a complete `<svg>` element so
//! the same markup can be inlined into the HTML report or converted to PDF.

use crate::core::metrics::{IndelLengthProfile, SubstitutionMatrix};
use crate::core::model::{Base, CanonicalClass};
use crate::report::format::{AxisTicks, escape_xml, fmt_int, fmt_tick, nice_max};
use anyhow::Result;
use std::fmt::Write as FmtWrite;

const ANCHORS: [Base; 2] = [Base::A, Base::C];

const SCALE_LOW: (u8, u8, u8) = (247, 251, 255);
const SCALE_HIGH: (u8, u8, u8) = (8, 48, 107);

/// Heatmap with reference alleles as columns and alternate alleles as rows.
/// Cells absent from the matrix are drawn as zero; cells where the alleles
/// coincide cannot occur and are left blank.
pub fn heatmap_svg(matrix: &SubstitutionMatrix) -> Result<String> {
    let (w, h) = (440.0, 380.0);
    let left = 70.0;
    let right = 110.0;
    let top = 16.0;
    let bottom = 50.0;
    let plot_w = w - left - right;
    let plot_h = h - top - bottom;
    let cell_w = plot_w / ANCHORS.len() as f64;
    let cell_h = plot_h / Base::ALL.len() as f64;
    let max = matrix.max();

    let mut out = String::with_capacity(8 * 1024);
    svg_open(&mut out, w, h)?;
    writeln!(
        out,
        "<defs><linearGradient id=\"heat\" x1=\"0\" y1=\"1\" x2=\"0\" y2=\"0\"><stop offset=\"0\" stop-color=\"{}\"/><stop offset=\"1\" stop-color=\"{}\"/></linearGradient></defs>",
        scale_color(0.0),
        scale_color(1.0)
    )?;

    for (i, alt) in Base::ALL.iter().enumerate() {
        let y = top + i as f64 * cell_h;
        for (j, reference) in ANCHORS.iter().enumerate() {
            let x = left + j as f64 * cell_w;
            if alt == reference {
                writeln!(
                    out,
                    "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#fff\" stroke=\"#ddd\"/>",
                    x, y, cell_w, cell_h
                )?;
                continue;
            }
            let v = matrix.get(*alt, *reference).unwrap_or(0);
            let t = if max == 0 { 0.0 } else { v as f64 / max as f64 };
            writeln!(
                out,
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" stroke=\"#fff\"/>",
                x,
                y,
                cell_w,
                cell_h,
                scale_color(t)
            )?;
            writeln!(
                out,
                "<text x=\"{}\" y=\"{}\" font-size=\"13\" fill=\"{}\" text-anchor=\"middle\" dominant-baseline=\"middle\">{}</text>",
                x + cell_w / 2.0,
                y + cell_h / 2.0,
                if t > 0.55 { "#fff" } else { "#222" },
                fmt_int(v)
            )?;
        }
        writeln!(
            out,
            "<text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"#444\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>",
            left - 8.0,
            y + cell_h / 2.0,
            alt
        )?;
    }
    for (j, reference) in ANCHORS.iter().enumerate() {
        writeln!(
            out,
            "<text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"#444\" text-anchor=\"middle\" dominant-baseline=\"hanging\">{}</text>",
            left + j as f64 * cell_w + cell_w / 2.0,
            top + plot_h + 6.0,
            reference
        )?;
    }
    draw_axis_labels(
        &mut out,
        left,
        top,
        plot_w,
        plot_h,
        "Reference allele",
        "Alternative allele",
    )?;

    let lx = left + plot_w + 24.0;
    writeln!(
        out,
        "<rect x=\"{}\" y=\"{}\" width=\"14\" height=\"{}\" fill=\"url(#heat)\" stroke=\"#ddd\"/>",
        lx, top, plot_h
    )?;
    writeln!(
        out,
        "<text x=\"{}\" y=\"{}\" font-size=\"10\" fill=\"#666\" dominant-baseline=\"hanging\">{}</text>",
        lx + 18.0,
        top,
        fmt_int(max)
    )?;
    writeln!(
        out,
        "<text x=\"{}\" y=\"{}\" font-size=\"10\" fill=\"#666\">0</text>",
        lx + 18.0,
        top + plot_h
    )?;
    out.push_str("</svg>");
    Ok(out)
}

/// Six-class substitution spectrum in the COSMIC palette.
pub fn spectrum_svg(counts: &[(CanonicalClass, u64)]) -> Result<String> {
    let (w, h) = (560.0, 280.0);
    let left = 60.0;
    let right = 20.0;
    let top = 16.0;
    let bottom = 44.0;
    let plot_w = w - left - right;
    let plot_h = h - top - bottom;

    let mut out = String::with_capacity(4 * 1024);
    svg_open(&mut out, w, h)?;
    plot_frame(&mut out, left, top, plot_w, plot_h)?;
    let max_y = nice_max(counts.iter().map(|&(_, n)| n as f64).fold(0.0, f64::max), 5);
    draw_y_axis_ticks(&mut out, left, top, plot_w, plot_h, 0.0, max_y, 5)?;

    let slot = plot_w / counts.len().max(1) as f64;
    for (i, (class, n)) in counts.iter().enumerate() {
        let bh = if max_y == 0.0 {
            0.0
        } else {
            *n as f64 / max_y * plot_h
        };
        let x = left + i as f64 * slot + slot * 0.15;
        writeln!(
            out,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
            x,
            top + plot_h - bh,
            slot * 0.7,
            bh,
            class.color()
        )?;
        writeln!(
            out,
            "<text x=\"{}\" y=\"{}\" font-size=\"11\" fill=\"#444\" text-anchor=\"middle\" dominant-baseline=\"hanging\">{}</text>",
            left + i as f64 * slot + slot / 2.0,
            top + plot_h + 4.0,
            escape_xml(class.label())
        )?;
    }
    draw_axis_labels(&mut out, left, top, plot_w, plot_h, "Substitution class", "Count")?;
    out.push_str("</svg>");
    Ok(out)
}

/// Bar per signed indel length; the profile is gap-free so bars sit on a
/// regular integer axis.
pub fn indel_bars_svg(profile: &IndelLengthProfile) -> Result<String> {
    let (w, h) = (800.0, 280.0);
    let left = 60.0;
    let right = 20.0;
    let top = 16.0;
    let bottom = 44.0;
    let plot_w = w - left - right;
    let plot_h = h - top - bottom;

    let mut out = String::with_capacity(16 * 1024);
    svg_open(&mut out, w, h)?;
    plot_frame(&mut out, left, top, plot_w, plot_h)?;
    let max_y = nice_max(profile.max_count() as f64, 5);
    draw_y_axis_ticks(&mut out, left, top, plot_w, plot_h, 0.0, max_y, 5)?;

    let min_len = profile.min_length();
    let slot = plot_w / profile.len().max(1) as f64;
    draw_length_ticks(
        &mut out,
        left,
        top,
        plot_h,
        slot,
        min_len,
        profile.max_length(),
    )?;
    for (i, &(_, n)) in profile.entries().iter().enumerate() {
        if n == 0 {
            continue;
        }
        let bh = if max_y == 0.0 {
            0.0
        } else {
            n as f64 / max_y * plot_h
        };
        writeln!(
            out,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#7db8da\"/>",
            left + i as f64 * slot + slot * 0.1,
            top + plot_h - bh,
            (slot * 0.8).max(1.0),
            bh
        )?;
    }
    draw_axis_labels(
        &mut out,
        left,
        top,
        plot_w,
        plot_h,
        "Length (deletions negative)",
        "Number of sites",
    )?;
    out.push_str("</svg>");
    Ok(out)
}

fn svg_open(out: &mut String, w: f64, h: f64) -> Result<()> {
    writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\" font-family=\"Arial, Helvetica, sans-serif\">",
        w, h, w, h
    )?;
    Ok(())
}

fn plot_frame(out: &mut String, left: f64, top: f64, plot_w: f64, plot_h: f64) -> Result<()> {
    writeln!(
        out,
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#fff\" stroke=\"#ddd\"/>",
        left, top, plot_w, plot_h
    )?;
    Ok(())
}

fn draw_y_axis_ticks(
    out: &mut String,
    left: f64,
    top: f64,
    plot_w: f64,
    plot_h: f64,
    min_y: f64,
    max_y: f64,
    ticks: usize,
) -> Result<()> {
    if ticks < 2 || (max_y - min_y).abs() < 1e-9 {
        return Ok(());
    }
    for v in AxisTicks::covering(min_y, max_y, ticks).values() {
        if v < min_y - 1e-9 || v > max_y + 1e-9 {
            continue;
        }
        let y = top + plot_h - ((v - min_y) / (max_y - min_y).max(1e-6)) * plot_h;
        writeln!(
            out,
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#eee\"/>",
            left,
            y,
            left + plot_w,
            y
        )?;
        writeln!(
            out,
            "<text x=\"{}\" y=\"{}\" font-size=\"10\" fill=\"#666\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>",
            left - 4.0,
            y,
            fmt_tick(v)
        )?;
    }
    Ok(())
}

/// Integer-valued x ticks centred on the bars of slot `slot`.
fn draw_length_ticks(
    out: &mut String,
    left: f64,
    top: f64,
    plot_h: f64,
    slot: f64,
    min_len: i64,
    max_len: i64,
) -> Result<()> {
    let step = if max_len > min_len {
        let ticks = AxisTicks::covering(min_len as f64, max_len as f64, 8);
        (ticks.step.round() as i64).max(1)
    } else {
        1
    };
    let first = min_len.div_euclid(step) * step;
    let mut v = if first < min_len { first + step } else { first };
    while v <= max_len {
        let x = left + ((v - min_len) as f64 + 0.5) * slot;
        writeln!(
            out,
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#eee\"/>",
            x,
            top,
            x,
            top + plot_h
        )?;
        writeln!(
            out,
            "<text x=\"{}\" y=\"{}\" font-size=\"10\" fill=\"#666\" text-anchor=\"middle\" dominant-baseline=\"hanging\">{}</text>",
            x,
            top + plot_h + 4.0,
            v
        )?;
        v += step;
    }
    Ok(())
}

fn draw_axis_labels(
    out: &mut String,
    left: f64,
    top: f64,
    plot_w: f64,
    plot_h: f64,
    x_label: &str,
    y_label: &str,
) -> Result<()> {
    let x = left + plot_w / 2.0;
    let y = top + plot_h + 30.0;
    writeln!(
        out,
        "<text x=\"{}\" y=\"{}\" font-size=\"11\" fill=\"#444\" text-anchor=\"middle\">{}</text>",
        x,
        y,
        escape_xml(x_label)
    )?;
    let yx = left - 36.0;
    let yy = top + plot_h / 2.0;
    writeln!(
        out,
        "<text x=\"{}\" y=\"{}\" font-size=\"11\" fill=\"#444\" text-anchor=\"middle\" transform=\"rotate(-90 {} {})\">{}</text>",
        yx,
        yy,
        yx,
        yy,
        escape_xml(y_label)
    )?;
    Ok(())
}

fn scale_color(t: f64) -> String {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        mix(SCALE_LOW.0, SCALE_HIGH.0),
        mix(SCALE_LOW.1, SCALE_HIGH.1),
        mix(SCALE_LOW.2, SCALE_HIGH.2)
    )
}
