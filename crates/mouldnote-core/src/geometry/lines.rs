use crate::model::{PositionedFragment, TextLine};

struct LineCluster {
    average_top: f64,
    fragments: Vec<PositionedFragment>,
}

/// Cluster fragments into lines by vertical position.
///
/// Each fragment joins the existing line whose running-average top is
/// within `tolerance` and closest to it; ties go to the line seen first.
/// Lines come back top to bottom with fragments sorted left to right.
pub fn group_lines(fragments: &[PositionedFragment], tolerance: f64) -> Vec<TextLine> {
    let mut clusters: Vec<LineCluster> = Vec::new();

    for fragment in fragments {
        let mut best: Option<(usize, f64)> = None;
        for (i, cluster) in clusters.iter().enumerate() {
            let diff = (cluster.average_top - fragment.top).abs();
            if diff <= tolerance && best.map_or(true, |(_, d)| diff < d) {
                best = Some((i, diff));
            }
        }

        match best {
            Some((i, _)) => {
                let cluster = &mut clusters[i];
                let n = cluster.fragments.len() as f64;
                cluster.average_top = (cluster.average_top * n + fragment.top) / (n + 1.0);
                cluster.fragments.push(fragment.clone());
            }
            None => clusters.push(LineCluster {
                average_top: fragment.top,
                fragments: vec![fragment.clone()],
            }),
        }
    }

    clusters.sort_by(|a, b| a.average_top.total_cmp(&b.average_top));
    clusters
        .into_iter()
        .map(|mut c| {
            c.fragments.sort_by(|a, b| a.left.total_cmp(&b.left));
            TextLine {
                vertical_position: c.average_top,
                fragments: c.fragments,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(text: &str, left: f64, top: f64) -> PositionedFragment {
        PositionedFragment::new(text, left, left + 10.0, top)
    }

    #[test]
    fn test_groups_by_tolerance_and_sorts() {
        let frags = vec![
            frag("b", 50.0, 101.0),
            frag("c", 10.0, 200.0),
            frag("a", 10.0, 100.0),
            frag("d", 60.0, 199.0),
        ];
        let lines = group_lines(&frags, 3.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "a b");
        assert_eq!(lines[1].text(), "c d");
        assert!(lines[0].vertical_position < lines[1].vertical_position);
    }

    #[test]
    fn test_closest_line_wins() {
        let frags = vec![frag("x", 0.0, 100.0), frag("y", 0.0, 105.0), frag("z", 20.0, 103.5)];
        let lines = group_lines(&frags, 3.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].text(), "y z");
    }

    #[test]
    fn test_outside_tolerance_opens_new_line() {
        let frags = vec![frag("x", 0.0, 100.0), frag("y", 0.0, 103.5)];
        assert_eq!(group_lines(&frags, 3.0).len(), 2);
    }
}
