//! Stroke renderer: turns the stroke list into an SVG tree.
//!
//! Draw strokes are grouped by how many eraser strokes precede them. All
//! eraser strokes live once in a hidden layer; each draw group that has an
//! eraser with the same ordinal is masked by that eraser and every later one.
//! Nothing is ever deleted from the ink itself.

use crate::svg::{SVG_NAMESPACE, SvgElement, XLINK_NAMESPACE};
use kurbo::Size;
use sketchcanvas_core::geometry::{PathDescriptor, SharedCurveGenerator};
use sketchcanvas_core::{CanvasConfig, PreserveAspectRatio, Stroke, StrokeStyle};

/// Namespaced element ids for one canvas instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementIds {
    prefix: String,
}

impl ElementIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn root(&self) -> &str {
        &self.prefix
    }

    pub fn background_pattern(&self) -> String {
        format!("{}__background", self.prefix)
    }

    pub fn background_group(&self) -> String {
        format!("{}__canvas-background-group", self.prefix)
    }

    pub fn canvas_background(&self) -> String {
        format!("{}__canvas-background", self.prefix)
    }

    pub fn eraser_group(&self) -> String {
        format!("{}__eraser-stroke-group", self.prefix)
    }

    pub fn mask_background(&self) -> String {
        format!("{}__mask-background", self.prefix)
    }

    pub fn eraser(&self, ordinal: usize) -> String {
        format!("{}__eraser-{}", self.prefix, ordinal)
    }

    pub fn eraser_mask(&self, group: usize) -> String {
        format!("{}__eraser-mask-{}", self.prefix, group)
    }

    pub fn stroke_group(&self, group: usize) -> String {
        format!("{}__stroke-group-{}", self.prefix, group)
    }

    pub fn stroke(&self, group: usize, index: usize) -> String {
        format!("{}__stroke-group-{}__paths__{}", self.prefix, group, index)
    }
}

/// Everything besides the strokes that affects rendering.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub ids: ElementIds,
    /// `width` attribute of the root element.
    pub width: String,
    /// `height` attribute of the root element.
    pub height: String,
    /// Explicit coordinate system, once the surface size is known.
    pub view_box: Option<Size>,
    pub canvas_color: String,
    /// Image reference for the background pattern, if any.
    pub background_image: Option<String>,
    pub preserve_aspect_ratio: PreserveAspectRatio,
    pub svg_style: Option<String>,
    pub class_name: Option<String>,
    pub curve_generator: SharedCurveGenerator,
}

impl RenderOptions {
    /// Options for live rendering, sized by the configured CSS dimensions.
    pub fn from_config(config: &CanvasConfig, curve_generator: SharedCurveGenerator) -> Self {
        Self {
            ids: ElementIds::new(config.id.clone()),
            width: config.width.clone(),
            height: config.height.clone(),
            view_box: None,
            canvas_color: config.canvas_color.clone(),
            background_image: config.background_image().map(str::to_string),
            preserve_aspect_ratio: config.preserve_background_image_aspect_ratio,
            svg_style: config.svg_style_attr(),
            class_name: (!config.class_name.is_empty()).then(|| config.class_name.clone()),
            curve_generator,
        }
    }

    /// Pin width, height and viewBox to a pixel size.
    pub fn with_size(mut self, size: Size) -> Self {
        self.width = size.width.to_string();
        self.height = size.height.to_string();
        self.view_box = Some(size);
        self
    }

    pub fn with_background_image(mut self, image: Option<String>) -> Self {
        self.background_image = image;
        self
    }
}

/// Draw strokes sharing the same count of preceding erasers.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawGroup<'a> {
    /// Number of eraser strokes before this group; also its mask ordinal.
    pub index: usize,
    pub strokes: Vec<&'a Stroke>,
}

/// Partition strokes into draw groups (in order, empty groups omitted) and
/// the eraser strokes (in order; position = ordinal).
pub fn partition(strokes: &[Stroke]) -> (Vec<DrawGroup<'_>>, Vec<&Stroke>) {
    let mut groups: Vec<DrawGroup<'_>> = Vec::new();
    let mut erasers = Vec::new();
    for stroke in strokes {
        if stroke.is_eraser() {
            erasers.push(stroke);
            continue;
        }
        let index = erasers.len();
        match groups.last_mut() {
            Some(group) if group.index == index => group.strokes.push(stroke),
            _ => groups.push(DrawGroup {
                index,
                strokes: vec![stroke],
            }),
        }
    }
    (groups, erasers)
}

/// Render one stroke. Empty strokes produce nothing; single points become
/// a filled circle of radius `width / 2`.
pub fn render_stroke(
    stroke: &Stroke,
    color: &str,
    id: String,
    generator: &SharedCurveGenerator,
) -> Option<SvgElement> {
    match generator.generate(&stroke.points) {
        PathDescriptor::Empty => None,
        PathDescriptor::Marker(center) => Some(
            SvgElement::new("circle")
                .attr("id", id)
                .attr("cx", center.x)
                .attr("cy", center.y)
                .attr("r", stroke.stroke_width / 2.0)
                .attr("fill", color)
                .attr("stroke", color),
        ),
        descriptor @ PathDescriptor::Curve(_) => {
            let d = descriptor.svg_data()?;
            Some(
                SvgElement::new("path")
                    .attr("id", id)
                    .attr("d", d)
                    .attr("fill", "none")
                    .attr("stroke-linecap", "round")
                    .attr("stroke", color)
                    .attr("stroke-width", stroke.stroke_width),
            )
        }
    }
}

fn render_background(options: &RenderOptions) -> (Option<SvgElement>, SvgElement) {
    let ids = &options.ids;
    let pattern = options.background_image.as_ref().map(|href| {
        SvgElement::new("pattern")
            .attr("id", ids.background_pattern())
            .attr("x", 0)
            .attr("y", 0)
            .attr("width", "100%")
            .attr("height", "100%")
            .attr("patternUnits", "userSpaceOnUse")
            .child(
                SvgElement::new("image")
                    .attr("x", 0)
                    .attr("y", 0)
                    .attr("width", "100%")
                    .attr("height", "100%")
                    .attr("href", href)
                    .attr("xlink:href", href)
                    .attr("preserveAspectRatio", options.preserve_aspect_ratio),
            )
    });
    let fill = match &pattern {
        Some(_) => format!("url(#{})", ids.background_pattern()),
        None => options.canvas_color.clone(),
    };
    let group = SvgElement::new("g").attr("id", ids.background_group()).child(
        SvgElement::new("rect")
            .attr("id", ids.canvas_background())
            .attr("x", 0)
            .attr("y", 0)
            .attr("width", "100%")
            .attr("height", "100%")
            .attr("fill", fill),
    );
    (pattern, group)
}

fn render_erasers(
    erasers: &[&Stroke],
    options: &RenderOptions,
) -> (SvgElement, Vec<SvgElement>) {
    let ids = &options.ids;
    let layer = SvgElement::new("g")
        .attr("id", ids.eraser_group())
        .attr("display", "none")
        .child(
            SvgElement::new("rect")
                .attr("id", ids.mask_background())
                .attr("x", 0)
                .attr("y", 0)
                .attr("width", "100%")
                .attr("height", "100%")
                .attr("fill", "white"),
        )
        .with_children(erasers.iter().enumerate().filter_map(|(ordinal, stroke)| {
            render_stroke(
                stroke,
                StrokeStyle::ERASER_COLOR,
                ids.eraser(ordinal),
                &options.curve_generator,
            )
        }));

    // Mask g reveals everything except erasers g, g+1, ...
    let masks = (0..erasers.len())
        .map(|group| {
            SvgElement::new("mask")
                .attr("id", ids.eraser_mask(group))
                .attr("maskUnits", "userSpaceOnUse")
                .child(SvgElement::new("use").attr("href", format!("#{}", ids.mask_background())))
                .with_children((group..erasers.len()).map(|ordinal| {
                    SvgElement::new("use").attr("href", format!("#{}", ids.eraser(ordinal)))
                }))
        })
        .collect();
    (layer, masks)
}

/// Render the full canvas.
pub fn render(strokes: &[Stroke], options: &RenderOptions) -> SvgElement {
    let ids = &options.ids;
    let mut root = SvgElement::new("svg")
        .attr("version", "1.1")
        .attr("baseProfile", "full")
        .attr("xmlns", SVG_NAMESPACE)
        .attr("xmlns:xlink", XLINK_NAMESPACE)
        .attr("id", ids.root())
        .attr("width", &options.width)
        .attr("height", &options.height);
    if let Some(size) = options.view_box {
        root.set_attr("viewBox", format!("0 0 {} {}", size.width, size.height));
    }
    if let Some(style) = &options.svg_style {
        root.set_attr("style", style);
    }
    if let Some(class) = &options.class_name {
        root.set_attr("class", class);
    }

    let (pattern, background) = render_background(options);
    let mut defs = SvgElement::new("defs");
    if let Some(pattern) = pattern {
        defs.children.push(pattern);
    }

    let (groups, erasers) = partition(strokes);
    let mut eraser_layer = None;
    if !erasers.is_empty() {
        let (layer, masks) = render_erasers(&erasers, options);
        eraser_layer = Some(layer);
        defs.children.extend(masks);
    }

    root.children.push(defs);
    root.children.push(background);
    if let Some(layer) = eraser_layer {
        root.children.push(layer);
    }

    for group in &groups {
        let mut element = SvgElement::new("g").attr("id", ids.stroke_group(group.index));
        if group.index < erasers.len() {
            element.set_attr("mask", format!("url(#{})", ids.eraser_mask(group.index)));
        }
        element.children.extend(group.strokes.iter().enumerate().filter_map(|(i, stroke)| {
            render_stroke(
                stroke,
                &stroke.stroke_color,
                ids.stroke(group.index, i),
                &options.curve_generator,
            )
        }));
        root.children.push(element);
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use sketchcanvas_core::{PathDescriptor, StrokeStyle};

    fn options() -> RenderOptions {
        let config = CanvasConfig {
            id: "c".into(),
            ..CanvasConfig::default()
        };
        RenderOptions::from_config(&config, SharedCurveGenerator::default())
    }

    fn pen(points: &[(f64, f64)]) -> Stroke {
        Stroke::from_points(
            points.iter().map(|(x, y)| Point::new(*x, *y)).collect(),
            &StrokeStyle::draw("blue", 6.0),
        )
    }

    fn eraser(points: &[(f64, f64)]) -> Stroke {
        Stroke::from_points(
            points.iter().map(|(x, y)| Point::new(*x, *y)).collect(),
            &StrokeStyle::erase(10.0),
        )
    }

    fn hrefs(mask: &SvgElement) -> Vec<&str> {
        mask.children.iter().filter_map(|u| u.get_attr("href")).collect()
    }

    #[test]
    fn test_single_point_renders_circle() {
        let tree = render(&[pen(&[(5.0, 7.0)])], &options());
        let stroke = tree.find_by_id("c__stroke-group-0__paths__0").unwrap();
        assert_eq!(stroke.name, "circle");
        assert_eq!(stroke.get_attr("r"), Some("3"));
        assert_eq!(stroke.get_attr("cx"), Some("5"));
        assert_eq!(stroke.get_attr("fill"), Some("blue"));
        assert!(stroke.get_attr("d").is_none());
    }

    #[test]
    fn test_multi_point_renders_path() {
        let tree = render(&[pen(&[(0.0, 0.0), (10.0, 10.0)])], &options());
        let stroke = tree.find_by_id("c__stroke-group-0__paths__0").unwrap();
        assert_eq!(stroke.name, "path");
        assert!(stroke.get_attr("d").unwrap().starts_with("M 0,0 C"));
        assert_eq!(stroke.get_attr("stroke-width"), Some("6"));
        assert_eq!(stroke.get_attr("fill"), Some("none"));
    }

    #[test]
    fn test_empty_stroke_renders_nothing() {
        let tree = render(&[pen(&[])], &options());
        let group = tree.find_by_id("c__stroke-group-0").unwrap();
        assert!(group.children.is_empty());
    }

    #[test]
    fn test_no_erasers_no_masks() {
        let tree = render(&[pen(&[(0.0, 0.0)]), pen(&[(1.0, 1.0)])], &options());
        assert!(tree.find_by_id("c__eraser-stroke-group").is_none());
        let group = tree.find_by_id("c__stroke-group-0").unwrap();
        assert!(group.get_attr("mask").is_none());
        assert_eq!(group.children.len(), 2);
    }

    #[test]
    fn test_one_eraser_masks_preceding_group() {
        let strokes = [pen(&[(0.0, 0.0), (5.0, 5.0)]), eraser(&[(1.0, 1.0), (2.0, 2.0)])];
        let tree = render(&strokes, &options());

        let layer = tree.find_by_id("c__eraser-stroke-group").unwrap();
        assert_eq!(layer.get_attr("display"), Some("none"));
        // Mask background plus one eraser entry.
        assert_eq!(layer.children.len(), 2);
        let entry = tree.find_by_id("c__eraser-0").unwrap();
        assert_eq!(entry.get_attr("stroke"), Some("#000000"));

        let group = tree.find_by_id("c__stroke-group-0").unwrap();
        assert_eq!(group.get_attr("mask"), Some("url(#c__eraser-mask-0)"));
        let mask = tree.find_by_id("c__eraser-mask-0").unwrap();
        assert_eq!(hrefs(mask), vec!["#c__mask-background", "#c__eraser-0"]);
    }

    #[test]
    fn test_masks_are_forward_cumulative() {
        // A (draw), B (erase), D (draw), C (erase)
        let strokes = [
            pen(&[(0.0, 0.0)]),
            eraser(&[(0.0, 0.0)]),
            pen(&[(3.0, 3.0)]),
            eraser(&[(3.0, 3.0)]),
        ];
        let tree = render(&strokes, &options());
        let layer = tree.find_by_id("c__eraser-stroke-group").unwrap();
        assert_eq!(layer.children.len(), 3);

        let mask0 = tree.find_by_id("c__eraser-mask-0").unwrap();
        assert_eq!(
            hrefs(mask0),
            vec!["#c__mask-background", "#c__eraser-0", "#c__eraser-1"]
        );
        let mask1 = tree.find_by_id("c__eraser-mask-1").unwrap();
        assert_eq!(hrefs(mask1), vec!["#c__mask-background", "#c__eraser-1"]);

        assert_eq!(
            tree.find_by_id("c__stroke-group-1").unwrap().get_attr("mask"),
            Some("url(#c__eraser-mask-1)")
        );
    }

    #[test]
    fn test_group_after_last_eraser_is_unmasked() {
        let strokes = [pen(&[(0.0, 0.0)]), eraser(&[(0.0, 0.0)]), pen(&[(1.0, 1.0)])];
        let tree = render(&strokes, &options());
        let group = tree.find_by_id("c__stroke-group-1").unwrap();
        assert!(group.get_attr("mask").is_none());
    }

    #[test]
    fn test_partition_skips_indices_of_consecutive_erasers() {
        let strokes = [
            eraser(&[(0.0, 0.0)]),
            eraser(&[(0.0, 0.0)]),
            pen(&[(0.0, 0.0)]),
            pen(&[(1.0, 1.0)]),
        ];
        let (groups, erasers) = partition(&strokes);
        assert_eq!(erasers.len(), 2);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].index, 2);
        assert_eq!(groups[0].strokes.len(), 2);
    }

    #[test]
    fn test_background_color_and_image() {
        let tree = render(&[], &options());
        let rect = tree.find_by_id("c__canvas-background").unwrap();
        assert_eq!(rect.get_attr("fill"), Some("white"));
        assert!(tree.find_by_id("c__background").is_none());

        let with_image = options().with_background_image(Some("bg.png".into()));
        let tree = render(&[], &with_image);
        let rect = tree.find_by_id("c__canvas-background").unwrap();
        assert_eq!(rect.get_attr("fill"), Some("url(#c__background)"));
        let pattern = tree.find_by_id("c__background").unwrap();
        assert_eq!(pattern.children[0].get_attr("href"), Some("bg.png"));
        assert_eq!(pattern.children[0].get_attr("preserveAspectRatio"), Some("none"));
    }

    #[test]
    fn test_root_size_and_view_box() {
        let tree = render(&[], &options());
        assert_eq!(tree.get_attr("width"), Some("100%"));
        assert!(tree.get_attr("viewBox").is_none());

        let tree = render(&[], &options().with_size(Size::new(640.0, 480.0)));
        assert_eq!(tree.get_attr("width"), Some("640"));
        assert_eq!(tree.get_attr("height"), Some("480"));
        assert_eq!(tree.get_attr("viewBox"), Some("0 0 640 480"));
    }

    #[test]
    fn test_custom_curve_generator() {
        let mut opts = options();
        opts.curve_generator = SharedCurveGenerator::new(|_: &[Point]| PathDescriptor::Empty);
        let tree = render(&[pen(&[(0.0, 0.0), (1.0, 1.0)])], &opts);
        assert!(tree.find_by_id("c__stroke-group-0").unwrap().children.is_empty());
    }

    #[test]
    fn test_render_is_deterministic() {
        let strokes = [pen(&[(0.0, 0.0), (4.0, 2.0)]), eraser(&[(1.0, 1.0)])];
        let opts = options();
        assert_eq!(render(&strokes, &opts).to_markup(), render(&strokes, &opts).to_markup());
    }
}
