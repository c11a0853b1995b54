/// Share of the unwrapped row width that survives justification.
const FILL_RATIO: f64 = 0.7;
/// Average fraction of a row that is filled, since short segments end
/// their row early.
const LINE_FILL: f64 = 0.3;

/// Height guess for a section that has not been laid out yet.
///
/// A zero width (no viewport yet) estimates every section at zero.
pub fn estimate_height(
    avg_aspect_ratio: f64,
    num_assets: u64,
    container_width: f64,
    target_row_height: f64,
) -> f64 {
    if container_width <= 0.0 || num_assets == 0 {
        return 0.0;
    }
    let unwrapped = avg_aspect_ratio * num_assets as f64 * target_row_height * FILL_RATIO;
    let rows = (unwrapped / (container_width * LINE_FILL)).ceil();
    rows * target_row_height
}
