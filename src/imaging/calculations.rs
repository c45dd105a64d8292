//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Outcome of fitting a source size into a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitPlan {
    /// True iff the source exceeds the box on either axis.
    pub needs_resize: bool,
    pub width: u32,
    pub height: u32,
}

/// Fit `(width, height)` inside `(max_width, max_height)` without enlarging.
///
/// The scale factor is `min(max_width / width, max_height / height)`, applied
/// to both axes and floored, so the result never exceeds the box. The
/// constraining axis lands exactly on the box edge. Integer arithmetic keeps
/// the result free of float rounding surprises; each axis is at least 1px.
///
/// # Examples
/// ```
/// # use pixbudget::imaging::fit_within;
/// // 1200x800 into a 600x600 box → 600x400
/// let plan = fit_within(1200, 800, 600, 600);
/// assert!(plan.needs_resize);
/// assert_eq!((plan.width, plan.height), (600, 400));
///
/// // Already fits → unchanged
/// let plan = fit_within(300, 200, 600, 600);
/// assert!(!plan.needs_resize);
/// assert_eq!((plan.width, plan.height), (300, 200));
/// ```
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> FitPlan {
    if width <= max_width && height <= max_height {
        return FitPlan {
            needs_resize: false,
            width,
            height,
        };
    }

    let (w, h) = (u64::from(width), u64::from(height));
    let (max_w, max_h) = (u64::from(max_width), u64::from(max_height));

    // Compare max_w/w against max_h/h without dividing.
    let (new_w, new_h) = if max_w * h <= max_h * w {
        // Width is the constraining axis
        (max_w, h * max_w / w)
    } else {
        (w * max_h / h, max_h)
    };

    FitPlan {
        needs_resize: true,
        width: (new_w.max(1)) as u32,
        height: (new_h.max(1)) as u32,
    }
}
