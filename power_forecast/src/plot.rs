//! SVG charts of the series, diagnostics and forecast

use crate::aggregation::DailySummary;
use crate::diagnostics::Correlogram;
use crate::error::{ForecastError, Result};
use crate::forecast::ForecastResult;
use crate::models::{FittedArima, FittedForecastModel};
use crate::series::DailySeries;
use chrono::NaiveDate;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

const SIZE: (u32, u32) = (1000, 600);
const TALL: (u32, u32) = (1000, 900);

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

fn plot_error<E: std::fmt::Display>(err: E) -> ForecastError {
    ForecastError::PlotError(err.to_string())
}

/// Padded bounds of the finite values
fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    let pad = if hi > lo { 0.05 * (hi - lo) } else { 1.0 };
    (lo - pad, hi + pad)
}

fn date_label(dates: &[NaiveDate], x: f64) -> String {
    let i = x.round();
    if i < 0.0 {
        return String::new();
    }
    dates
        .get(i as usize)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn line_panel(area: &Area<'_>, title: &str, dates: &[NaiveDate], lines: &[(&str, &[f64], RGBColor)]) -> Result<()> {
    let x_max = dates.len().max(2) as f64 - 1.0;
    let (lo, hi) = value_range(lines.iter().flat_map(|(_, v, _)| v.iter().copied()));

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..x_max, lo..hi)
        .map_err(plot_error)?;
    chart
        .configure_mesh()
        .x_labels(6)
        .x_label_formatter(&|x| date_label(dates, *x))
        .draw()
        .map_err(plot_error)?;

    for &(label, values, color) in lines {
        chart
            .draw_series(LineSeries::new(
                values.iter().enumerate().map(|(i, v)| (i as f64, *v)),
                &color,
            ))
            .map_err(plot_error)?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], color));
    }
    if lines.len() > 1 {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(plot_error)?;
    }
    Ok(())
}

fn bar_panel(area: &Area<'_>, title: &str, values: &[f64], bound: f64) -> Result<()> {
    let x_max = values.len() as f64 + 1.0;
    let (lo, hi) = value_range(values.iter().copied().chain([bound, -bound]));

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 16))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..x_max, lo.min(0.0)..hi.max(0.0))
        .map_err(plot_error)?;
    chart.configure_mesh().x_desc("Lag").draw().map_err(plot_error)?;

    chart
        .draw_series(values.iter().enumerate().map(|(i, r)| {
            let x = (i + 1) as f64;
            Rectangle::new([(x - 0.15, 0.0), (x + 0.15, *r)], BLUE.filled())
        }))
        .map_err(plot_error)?;
    for level in [bound, -bound] {
        chart
            .draw_series(LineSeries::new(vec![(0.0, level), (x_max, level)], &RED))
            .map_err(plot_error)?;
    }
    chart
        .draw_series(LineSeries::new(vec![(0.0, 0.0), (x_max, 0.0)], &BLACK))
        .map_err(plot_error)?;
    Ok(())
}

/// Line chart of a daily series
pub fn plot_series<P: AsRef<Path>>(path: P, title: &str, series: &DailySeries) -> Result<()> {
    let root = SVGBackend::new(path.as_ref(), SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;
    line_panel(&root, title, series.dates(), &[("value", series.values(), BLUE)])?;
    root.present().map_err(plot_error)?;
    Ok(())
}

/// Daily temperature, wind direction and wind speed, one panel each
pub fn plot_covariates<P: AsRef<Path>>(path: P, summaries: &[DailySummary]) -> Result<()> {
    let root = SVGBackend::new(path.as_ref(), TALL).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let dates: Vec<NaiveDate> = summaries.iter().map(|s| s.date).collect();
    let temperature: Vec<f64> = summaries.iter().map(|s| s.ambient_temperature).collect();
    let direction: Vec<f64> = summaries.iter().map(|s| s.wind_direction).collect();
    let speed: Vec<f64> = summaries.iter().map(|s| s.wind_speed).collect();

    let panels = root.split_evenly((3, 1));
    line_panel(&panels[0], "Ambient temperature", &dates, &[("temperature", &temperature, RED)])?;
    line_panel(&panels[1], "Wind direction", &dates, &[("direction", &direction, GREEN)])?;
    line_panel(&panels[2], "Wind speed", &dates, &[("speed", &speed, BLUE)])?;

    root.present().map_err(plot_error)?;
    Ok(())
}

/// ACF and PACF bars with the white-noise band
pub fn plot_correlogram<P: AsRef<Path>>(path: P, title: &str, correlogram: &Correlogram) -> Result<()> {
    let root = SVGBackend::new(path.as_ref(), SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let panels = root.split_evenly((2, 1));
    bar_panel(&panels[0], &format!("{}: ACF", title), &correlogram.acf, correlogram.bound)?;
    bar_panel(&panels[1], &format!("{}: PACF", title), &correlogram.pacf, correlogram.bound)?;

    root.present().map_err(plot_error)?;
    Ok(())
}

/// Residuals of a fitted model over time with their ACF
pub fn plot_residuals<P: AsRef<Path>>(path: P, fitted: &FittedArima, correlogram: &Correlogram) -> Result<()> {
    let root = SVGBackend::new(path.as_ref(), TALL).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let panels = root.split_evenly((2, 1));
    let title = format!("Residuals from {}", fitted.name());
    line_panel(
        &panels[0],
        &title,
        fitted.series().dates(),
        &[("residual", fitted.residuals(), BLACK)],
    )?;
    bar_panel(&panels[1], "Residual ACF", &correlogram.acf, correlogram.bound)?;

    root.present().map_err(plot_error)?;
    Ok(())
}

/// The last `tail` days of the series followed by the forecast and its
/// 80% and 95% bands
pub fn plot_forecast<P: AsRef<Path>>(
    path: P,
    series: &DailySeries,
    forecast: &ForecastResult,
    tail: usize,
) -> Result<()> {
    let root = SVGBackend::new(path.as_ref(), SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let start = series.len().saturating_sub(tail);
    let history = &series.values()[start..];
    let dates: Vec<NaiveDate> = series.dates()[start..]
        .iter()
        .chain(forecast.dates())
        .copied()
        .collect();
    let offset = history.len() as f64;
    let x_max = dates.len().max(2) as f64 - 1.0;

    let bounds = forecast
        .intervals()
        .iter()
        .flat_map(|i| i.lower.iter().chain(&i.upper).copied());
    let (lo, hi) = value_range(history.iter().chain(forecast.values()).copied().chain(bounds));

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Forecasts from {}", forecast.model()), ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..x_max, lo..hi)
        .map_err(plot_error)?;
    chart
        .configure_mesh()
        .x_labels(6)
        .x_label_formatter(&|x| date_label(&dates, *x))
        .draw()
        .map_err(plot_error)?;

    // Widest band first so the narrower one stays visible
    let mut intervals: Vec<_> = forecast.intervals().iter().collect();
    intervals.sort_by(|a, b| b.level.total_cmp(&a.level));
    for (k, interval) in intervals.iter().enumerate() {
        let mut outline: Vec<(f64, f64)> = interval
            .upper
            .iter()
            .enumerate()
            .map(|(i, v)| (offset + i as f64, *v))
            .collect();
        outline.extend(
            interval
                .lower
                .iter()
                .enumerate()
                .rev()
                .map(|(i, v)| (offset + i as f64, *v)),
        );
        let shade = BLUE.mix(0.15 + 0.15 * k as f64);
        chart
            .draw_series(std::iter::once(Polygon::new(outline, shade)))
            .map_err(plot_error)?;
    }

    chart
        .draw_series(LineSeries::new(
            history.iter().enumerate().map(|(i, v)| (i as f64, *v)),
            &BLACK,
        ))
        .map_err(plot_error)?
        .label("observed")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], BLACK));
    chart
        .draw_series(LineSeries::new(
            forecast
                .values()
                .iter()
                .enumerate()
                .map(|(i, v)| (offset + i as f64, *v)),
            &BLUE,
        ))
        .map_err(plot_error)?
        .label("forecast")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], BLUE));
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_range_pads() {
        let (lo, hi) = value_range([1.0, 3.0, f64::NAN].into_iter());
        assert!(lo < 1.0 && hi > 3.0);
        assert_eq!(value_range([2.0].into_iter()), (1.0, 3.0));
        assert_eq!(value_range(std::iter::empty()), (0.0, 1.0));
    }

    #[test]
    fn test_date_label_bounds() {
        let dates = vec![NaiveDate::from_ymd_opt(2019, 5, 1).unwrap()];
        assert_eq!(date_label(&dates, 0.2), "2019-05-01");
        assert_eq!(date_label(&dates, 4.0), "");
        assert_eq!(date_label(&dates, -1.0), "");
    }
}
