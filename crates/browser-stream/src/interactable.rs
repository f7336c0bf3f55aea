//! Interactable Check (§4.4): a resolved node is interactable if its
//! content-box centroid falls inside the page's visual viewport, after one
//! `scrollIntoViewIfNeeded` retry if it didn't start out that way.

use chromiumoxide::cdp::browser_protocol::dom::{
    GetBoxModelParams, NodeId, ScrollIntoViewIfNeededParams,
};
use chromiumoxide::cdp::browser_protocol::page::GetLayoutMetricsParams;
use thiserror::Error;

use crate::cdp::{CdpChannel, CdpError};
use crate::registry::BackendNodeId;

/// A 2D point. Used for both page (document) coordinates, as returned by
/// `DOM.getBoxModel`, and viewport coordinates, as `Input.dispatchMouseEvent`
/// expects — see [`to_viewport_coords`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Errors from the interactable check.
#[derive(Debug, Error)]
pub enum InteractableError {
    /// The node has no box model, or its centroid still lies outside the
    /// visual viewport after a scroll-into-view retry.
    #[error("element is not interactable")]
    NotInteractable,
    /// The CDP channel itself failed (crashed/disconnected).
    #[error(transparent)]
    Cdp(#[from] CdpError),
}

/// Average the 8-number `[x1,y1,x2,y2,x3,y3,x4,y4]` content quad CDP
/// returns for `DOM.getBoxModel` into its centroid.
fn centroid(quad: &[f64]) -> Option<Point> {
    if quad.len() != 8 {
        return None;
    }
    let xs: f64 = quad.iter().step_by(2).sum();
    let ys: f64 = quad.iter().skip(1).step_by(2).sum();
    Some(Point {
        x: xs / 4.0,
        y: ys / 4.0,
    })
}

/// `p` in page (document) coordinates, `width`/`height` the visual
/// viewport's client size. Per §4.4 the centroid must fall inside
/// `[0,width]×[0,height]` in *viewport* coordinates; since `DOM.getBoxModel`
/// returns page coordinates, `p` is first translated by the viewport's
/// scroll offset before the bounds check.
fn in_viewport(p: Point, offset_x: f64, offset_y: f64, width: f64, height: f64) -> bool {
    let v = to_viewport_coords(p, offset_x, offset_y);
    v.x >= 0.0 && v.x <= width && v.y >= 0.0 && v.y <= height
}

/// Translate a page-coordinate point into viewport coordinates by
/// subtracting the visual viewport's scroll offset.
fn to_viewport_coords(p: Point, offset_x: f64, offset_y: f64) -> Point {
    Point {
        x: p.x - offset_x,
        y: p.y - offset_y,
    }
}

async fn box_model_centroid(
    channel: &CdpChannel,
    backend_node_id: BackendNodeId,
) -> Result<Point, InteractableError> {
    let model = channel
        .send(
            GetBoxModelParams::builder()
                .backend_node_id(NodeId::from(backend_node_id))
                .build(),
        )
        .await
        .map_err(|e| match e {
            CdpError::PageCrashed | CdpError::Disconnected(_) => InteractableError::Cdp(e),
            CdpError::Command(_) | CdpError::Setup(_) => InteractableError::NotInteractable,
        })?;
    centroid(&model.model.content).ok_or(InteractableError::NotInteractable)
}

async fn visual_viewport_bounds(channel: &CdpChannel) -> Result<(f64, f64, f64, f64), InteractableError> {
    let metrics = channel.send(GetLayoutMetricsParams::default()).await?;
    let vv = metrics.visual_viewport;
    Ok((vv.page_x, vv.page_y, vv.client_width, vv.client_height))
}

/// Resolve whether `backend_node_id`'s centroid is within the visual
/// viewport, retrying once via `scrollIntoViewIfNeeded` if it is not.
///
/// Returns the centroid translated into viewport coordinates (CSS pixels
/// relative to the visible viewport's top-left), the coordinate space
/// `Input.dispatchMouseEvent` expects — `DOM.getBoxModel`'s quad is in page
/// (document) coordinates, so the viewport's scroll offset is subtracted
/// before returning.
///
/// # Errors
///
/// Returns [`InteractableError::NotInteractable`] if the node has no box
/// model, or still lies outside the viewport after the retry, or
/// [`InteractableError::Cdp`] if the channel itself failed.
pub async fn ensure_interactable(
    channel: &CdpChannel,
    backend_node_id: BackendNodeId,
) -> Result<Point, InteractableError> {
    let point = box_model_centroid(channel, backend_node_id).await?;
    let (x, y, w, h) = visual_viewport_bounds(channel).await?;
    if in_viewport(point, x, y, w, h) {
        return Ok(to_viewport_coords(point, x, y));
    }

    channel
        .send(
            ScrollIntoViewIfNeededParams::builder()
                .backend_node_id(NodeId::from(backend_node_id))
                .build(),
        )
        .await?;

    let point = box_model_centroid(channel, backend_node_id).await?;
    let (x, y, w, h) = visual_viewport_bounds(channel).await?;
    if in_viewport(point, x, y, w, h) {
        Ok(to_viewport_coords(point, x, y))
    } else {
        Err(InteractableError::NotInteractable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_of_axis_aligned_quad() {
        let quad = vec![0.0, 0.0, 10.0, 0.0, 10.0, 10.0, 0.0, 10.0];
        let p = centroid(&quad).unwrap();
        assert_eq!(p, Point { x: 5.0, y: 5.0 });
    }

    #[test]
    fn centroid_returns_none_for_malformed_quad() {
        assert!(centroid(&[0.0, 0.0]).is_none());
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn point_inside_viewport() {
        let p = Point { x: 50.0, y: 50.0 };
        assert!(in_viewport(p, 0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn point_outside_each_edge_is_rejected() {
        assert!(!in_viewport(Point { x: -1.0, y: 50.0 }, 0.0, 0.0, 100.0, 100.0));
        assert!(!in_viewport(Point { x: 50.0, y: -1.0 }, 0.0, 0.0, 100.0, 100.0));
        assert!(!in_viewport(Point { x: 101.0, y: 50.0 }, 0.0, 0.0, 100.0, 100.0));
        assert!(!in_viewport(Point { x: 50.0, y: 101.0 }, 0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn point_on_viewport_boundary_counts_as_inside() {
        assert!(in_viewport(Point { x: 0.0, y: 0.0 }, 0.0, 0.0, 100.0, 100.0));
        assert!(in_viewport(Point { x: 100.0, y: 100.0 }, 0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn viewport_offset_by_scroll_is_honored() {
        // A page-coordinate point that lands inside the visible viewport
        // once the scroll offset is subtracted, but not if no offset is
        // applied.
        let p = Point { x: 250.0, y: 450.0 };
        assert!(in_viewport(p, 200.0, 400.0, 100.0, 100.0));
        assert!(!in_viewport(p, 0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn to_viewport_coords_subtracts_scroll_offset() {
        let p = Point { x: 250.0, y: 450.0 };
        let v = to_viewport_coords(p, 200.0, 400.0);
        assert_eq!(v, Point { x: 50.0, y: 50.0 });
    }
}
