//! Text rendering of a histogram against a fitted curve.

const BAR_WIDTH: usize = 50;

/// Log one line per bin: centre, observed height, model height, and a bar.
///
/// `#` marks the observed height, `|` the model height.
pub(crate) fn log_histogram_fit<F: Fn(f64) -> f64>(
    label: &str,
    centers: &[f64],
    heights: &[f64],
    model: F,
) {
    let predicted: Vec<f64> = centers.iter().map(|&x| model(x)).collect();
    let peak = heights
        .iter()
        .chain(predicted.iter())
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    if peak <= 0.0 {
        tracing::info!("{label}: histogram is empty");
        return;
    }

    tracing::info!("{label}: histogram ({} bins) vs fit", centers.len());
    for ((&x, &h), &m) in centers.iter().zip(heights).zip(&predicted) {
        tracing::info!("{x:>12.4} {h:>10.4} {m:>10.4} {}", render_bar(h, m, peak));
    }
}

fn render_bar(observed: f64, model: f64, peak: f64) -> String {
    let scale = |v: f64| ((v / peak) * BAR_WIDTH as f64).round().clamp(0.0, BAR_WIDTH as f64) as usize;
    let filled = scale(observed);
    let marker = scale(model);
    let mut bar: Vec<char> = (0..=BAR_WIDTH)
        .map(|i| if i < filled { '#' } else { ' ' })
        .collect();
    bar[marker] = '|';
    bar.into_iter().collect::<String>().trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_bar_marks_model() {
        let bar = render_bar(1.0, 0.5, 1.0);
        assert_eq!(bar.chars().filter(|&c| c == '#').count(), BAR_WIDTH - 1);
        assert_eq!(bar.chars().nth(BAR_WIDTH / 2), Some('|'));
    }

    #[test]
    fn test_render_bar_empty_observation() {
        let bar = render_bar(0.0, 1.0, 1.0);
        assert_eq!(bar.trim(), "|");
    }
}
