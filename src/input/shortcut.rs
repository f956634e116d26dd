#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutKey {
    Character(char),
    Enter,
    Escape,
    Delete,
    Backspace,
    PageUp,
    PageDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShortcutModifiers {
    pub ctrl: bool,
    pub shift: bool,
}

impl ShortcutModifiers {
    pub const fn new(ctrl: bool, shift: bool) -> Self {
        Self { ctrl, shift }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputContext {
    pub document_loaded: bool,
    pub crop_active: bool,
    pub mask_active: bool,
    pub select_mode: bool,
    pub multi_page: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    CropApply,
    CropCancel,
    RemovalApply,
    RemovalCancel,
    Undo,
    Redo,
    DeleteSelection,
    Export,
    EnterSelect,
    EnterDraw,
    EnterHighlighter,
    EnterErase,
    EnterCrop,
    EnterMask,
    InsertText,
    InsertRectangle,
    InsertEllipse,
    BringForward,
    SendBackward,
    RotateBackground,
    FlipBackground,
    ZoomIn,
    ZoomOut,
    ZoomReset,
    NextPage,
    PreviousPage,
}

fn resolve_crop_shortcut(key: ShortcutKey) -> Option<ShortcutAction> {
    match key {
        ShortcutKey::Enter => Some(ShortcutAction::CropApply),
        ShortcutKey::Escape => Some(ShortcutAction::CropCancel),
        _ => None,
    }
}

fn resolve_mask_shortcut(key: ShortcutKey) -> Option<ShortcutAction> {
    match key {
        ShortcutKey::Enter => Some(ShortcutAction::RemovalApply),
        ShortcutKey::Escape => Some(ShortcutAction::RemovalCancel),
        _ => None,
    }
}

fn resolve_tool_shortcut(key: ShortcutKey) -> Option<ShortcutAction> {
    match key {
        ShortcutKey::Character('v') => Some(ShortcutAction::EnterSelect),
        ShortcutKey::Character('p') => Some(ShortcutAction::EnterDraw),
        ShortcutKey::Character('h') => Some(ShortcutAction::EnterHighlighter),
        ShortcutKey::Character('e') => Some(ShortcutAction::EnterErase),
        ShortcutKey::Character('c') => Some(ShortcutAction::EnterCrop),
        ShortcutKey::Character('m') => Some(ShortcutAction::EnterMask),
        ShortcutKey::Character('t') => Some(ShortcutAction::InsertText),
        ShortcutKey::Character('r') => Some(ShortcutAction::InsertRectangle),
        ShortcutKey::Character('o') => Some(ShortcutAction::InsertEllipse),
        ShortcutKey::Character(']') => Some(ShortcutAction::BringForward),
        ShortcutKey::Character('[') => Some(ShortcutAction::SendBackward),
        ShortcutKey::Character('+') | ShortcutKey::Character('=') => Some(ShortcutAction::ZoomIn),
        ShortcutKey::Character('-') => Some(ShortcutAction::ZoomOut),
        ShortcutKey::Character('0') => Some(ShortcutAction::ZoomReset),
        _ => None,
    }
}

fn resolve_editor_shortcut(
    key: ShortcutKey,
    modifiers: ShortcutModifiers,
    context: InputContext,
) -> Option<ShortcutAction> {
    match (key, modifiers.ctrl, modifiers.shift) {
        (ShortcutKey::Character('z'), true, false) => Some(ShortcutAction::Undo),
        (ShortcutKey::Character('z'), true, true) | (ShortcutKey::Character('y'), true, false) => {
            Some(ShortcutAction::Redo)
        }
        (ShortcutKey::Delete, false, false) | (ShortcutKey::Backspace, false, false) => {
            Some(ShortcutAction::DeleteSelection)
        }
        (ShortcutKey::Character('s'), true, _) => Some(ShortcutAction::Export),
        (ShortcutKey::Character('r'), true, false) => Some(ShortcutAction::RotateBackground),
        (ShortcutKey::Character('f'), true, false) => Some(ShortcutAction::FlipBackground),
        (ShortcutKey::PageDown, false, false) if context.multi_page => {
            Some(ShortcutAction::NextPage)
        }
        (ShortcutKey::PageUp, false, false) if context.multi_page => {
            Some(ShortcutAction::PreviousPage)
        }
        (ShortcutKey::Escape, false, false) if !context.select_mode => {
            Some(ShortcutAction::EnterSelect)
        }
        (_, false, false) => resolve_tool_shortcut(key),
        _ => None,
    }
}

pub fn resolve_shortcut(
    key: ShortcutKey,
    modifiers: ShortcutModifiers,
    context: InputContext,
) -> Option<ShortcutAction> {
    if !context.document_loaded {
        return None;
    }

    if context.crop_active {
        if let Some(action) = resolve_crop_shortcut(key) {
            return Some(action);
        }
    }

    if context.mask_active {
        if let Some(action) = resolve_mask_shortcut(key) {
            return Some(action);
        }
    }

    resolve_editor_shortcut(key, modifiers, context)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_context() -> InputContext {
        InputContext {
            document_loaded: true,
            select_mode: true,
            ..InputContext::default()
        }
    }

    #[test]
    fn resolve_shortcut_ignores_keys_without_document() {
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('z'),
                ShortcutModifiers::new(true, false),
                InputContext::default()
            ),
            None
        );
    }

    #[test]
    fn resolve_shortcut_prioritizes_crop_context() {
        let context = InputContext {
            crop_active: true,
            select_mode: false,
            ..editor_context()
        };
        assert_eq!(
            resolve_shortcut(ShortcutKey::Enter, ShortcutModifiers::default(), context),
            Some(ShortcutAction::CropApply)
        );
        assert_eq!(
            resolve_shortcut(ShortcutKey::Escape, ShortcutModifiers::default(), context),
            Some(ShortcutAction::CropCancel)
        );
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('z'),
                ShortcutModifiers::new(true, false),
                context
            ),
            Some(ShortcutAction::Undo)
        );
    }

    #[test]
    fn resolve_shortcut_maps_mask_confirmation() {
        let context = InputContext {
            mask_active: true,
            select_mode: false,
            ..editor_context()
        };
        assert_eq!(
            resolve_shortcut(ShortcutKey::Enter, ShortcutModifiers::default(), context),
            Some(ShortcutAction::RemovalApply)
        );
    }

    #[test]
    fn resolve_shortcut_maps_undo_and_redo() {
        let context = editor_context();
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('z'),
                ShortcutModifiers::new(true, false),
                context
            ),
            Some(ShortcutAction::Undo)
        );
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('z'),
                ShortcutModifiers::new(true, true),
                context
            ),
            Some(ShortcutAction::Redo)
        );
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('y'),
                ShortcutModifiers::new(true, false),
                context
            ),
            Some(ShortcutAction::Redo)
        );
    }

    #[test]
    fn escape_returns_to_select_only_outside_select_mode() {
        let drawing = InputContext {
            select_mode: false,
            ..editor_context()
        };
        assert_eq!(
            resolve_shortcut(ShortcutKey::Escape, ShortcutModifiers::default(), drawing),
            Some(ShortcutAction::EnterSelect)
        );
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Escape,
                ShortcutModifiers::default(),
                editor_context()
            ),
            None
        );
    }

    #[test]
    fn page_keys_require_multi_page_document() {
        let single = editor_context();
        let multi = InputContext {
            multi_page: true,
            ..editor_context()
        };
        assert_eq!(
            resolve_shortcut(ShortcutKey::PageDown, ShortcutModifiers::default(), single),
            None
        );
        assert_eq!(
            resolve_shortcut(ShortcutKey::PageDown, ShortcutModifiers::default(), multi),
            Some(ShortcutAction::NextPage)
        );
    }

    #[test]
    fn tool_letters_require_no_modifiers() {
        let context = editor_context();
        assert_eq!(
            resolve_shortcut(ShortcutKey::Character('r'), ShortcutModifiers::default(), context),
            Some(ShortcutAction::InsertRectangle)
        );
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('r'),
                ShortcutModifiers::new(true, false),
                context
            ),
            Some(ShortcutAction::RotateBackground)
        );
        assert_eq!(
            resolve_shortcut(
                ShortcutKey::Character('p'),
                ShortcutModifiers::new(false, true),
                context
            ),
            None
        );
    }
}
