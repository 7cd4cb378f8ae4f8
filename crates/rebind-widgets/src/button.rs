#![forbid(unsafe_code)]

//! Stateless button.

use rebind_dom::{Element, Event, el};

/// CSS class carried by every button.
pub const BUTTON_CLASS: &str = "my-btn";

/// A `<button class="my-btn">` labelled `label` that runs `on_click` when
/// clicked.
#[must_use]
pub fn button(label: impl Into<String>, on_click: impl Fn(&Event) + 'static) -> Element {
    el("button")
        .class(BUTTON_CLASS)
        .on("click", on_click)
        .child(label.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebind_dom::{Document, MemoryDocument, SharedDocument, dispatch, shared};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn renders_label_and_class() {
        let mut doc = MemoryDocument::new();
        let root = doc.create_element("div");
        button("Add Qty by 1", |_| {}).mount(&mut doc, root).unwrap();
        assert_eq!(
            doc.inner_html(root).unwrap(),
            "<button class=\"my-btn\">Add Qty by 1</button>"
        );
    }

    #[test]
    fn click_invokes_handler() {
        let doc = shared(MemoryDocument::new());
        let root = doc.borrow_mut().create_element("div");
        let clicks = Rc::new(Cell::new(0));
        let c = Rc::clone(&clicks);
        button("go", move |_| c.set(c.get() + 1))
            .mount(&mut *doc.borrow_mut(), root)
            .unwrap();

        let target = doc.borrow().find_by_tag(root, "button").unwrap()[0];
        let host: SharedDocument = doc.clone();
        assert_eq!(dispatch(&host, target, "click").unwrap(), 1);
        assert_eq!(clicks.get(), 1);
    }
}
