//! Localized UI strings and the persisted language choice.

use yijing_core::{
  language::Language,
  method::DivinationMethod,
  storage::{LANGUAGE_KEY, Storage},
};

use crate::{Error, Result};

/// Every user-visible string, one table per language.
#[derive(Debug)]
pub struct Strings {
  pub app_title:              &'static str,
  pub online:                 &'static str,
  pub offline:                &'static str,

  pub question:               &'static str,
  pub question_placeholder:   &'static str,
  pub diviner:                &'static str,
  pub anonymous:              &'static str,
  pub notes:                  &'static str,
  pub method:                 &'static str,
  pub coins:                  &'static str,
  pub numbers:                &'static str,
  pub time:                   &'static str,
  pub random:                 &'static str,
  pub digits_hint:            &'static str,
  pub throwing:               &'static str,
  pub input_ready:            &'static str,
  pub najia_toggle:           &'static str,
  pub divining:               &'static str,
  pub submit_hint:            &'static str,

  pub original:               &'static str,
  pub changed:                &'static str,
  pub mutual:                 &'static str,
  pub najia:                  &'static str,
  pub interpretation:         &'static str,
  pub changing_lines:         &'static str,
  pub no_changes:             &'static str,
  pub no_result:              &'static str,
  pub judgement:              &'static str,
  pub image:                  &'static str,
  pub world_line:             &'static str,
  pub response_line:          &'static str,
  pub void_lines:             &'static str,

  pub chat_title:             &'static str,
  pub chat_empty:             &'static str,
  pub chat_needs_result:      &'static str,
  pub thinking:               &'static str,
  pub you:                    &'static str,
  pub assistant:              &'static str,

  pub history_title:          &'static str,
  pub history_empty:          &'static str,
  pub history_hint:           &'static str,
  pub record_interpretation:  &'static str,
  pub viewing_record:         &'static str,

  pub divination_done:        &'static str,
  pub divination_failed:      &'static str,
  pub fallback_interpretation: &'static str,
  pub refresh_failed:         &'static str,
  pub chat_failed:            &'static str,
  pub saved:                  &'static str,
  pub save_failed:            &'static str,
  pub downloaded:             &'static str,
  pub download_failed:        &'static str,
  pub copied:                 &'static str,
  pub copy_manual:            &'static str,
  pub history_cleared:        &'static str,
  pub clear_failed:           &'static str,
  pub history_load_failed:    &'static str,
  pub history_exported:       &'static str,
  pub export_failed:          &'static str,
  pub reset_done:             &'static str,
  pub help_failed:            &'static str,
  pub language_save_failed:   &'static str,
  pub help_title:             &'static str,

  pub report_title:           &'static str,
  pub report_question:        &'static str,
  pub report_diviner:         &'static str,
  pub report_time:            &'static str,
  pub report_original:        &'static str,
  pub report_changed:         &'static str,
  pub report_interpretation:  &'static str,
  pub report_notes:           &'static str,
  pub report_footer:          &'static str,
  pub report_file_prefix:     &'static str,

  pub keys_workbench:         &'static str,
  pub keys_history:           &'static str,
  pub keys_overlay:           &'static str,
}

pub static ZH: Strings = Strings {
  app_title:              "易经占卜",
  online:                 "在线",
  offline:                "离线",

  question:               "所问之事",
  question_placeholder:   "请输入您想占卜的问题",
  diviner:                "占卜者",
  anonymous:              "匿名",
  notes:                  "备注",
  method:                 "起卦方式",
  coins:                  "铜钱",
  numbers:                "数字",
  time:                   "时间",
  random:                 "随机",
  digits_hint:            "请输入至少两位数字",
  throwing:               "掷币中",
  input_ready:            "已起卦",
  najia_toggle:           "纳甲",
  divining:               "占卜中…",
  submit_hint:            "Ctrl+Enter 开始占卜",

  original:               "本卦",
  changed:                "变卦",
  mutual:                 "互卦",
  najia:                  "纳甲",
  interpretation:         "解读",
  changing_lines:         "变爻",
  no_changes:             "无变爻",
  no_result:              "尚未占卜。输入问题后按 Ctrl+Enter。",
  judgement:              "卦辞",
  image:                  "象辞",
  world_line:             "世爻",
  response_line:          "应爻",
  void_lines:             "空亡",

  chat_title:             "AI 解卦",
  chat_empty:             "就此卦继续提问",
  chat_needs_result:      "完成占卜后即可与 AI 对话",
  thinking:               "思考中…",
  you:                    "我",
  assistant:              "AI",

  history_title:          "历史记录",
  history_empty:          "暂无历史记录",
  history_hint:           "↑↓ 选择  Enter 查看  x 清空  e 导出  Esc 返回",
  record_interpretation:  "这是一条历史记录，仅保留卦名与备注。",
  viewing_record:         "正在查看历史记录",

  divination_done:        "占卜完成",
  divination_failed:      "占卜失败",
  fallback_interpretation: "暂时无法连接占卜服务，以下为本地生成的示例结果。",
  refresh_failed:         "切换语言后刷新失败",
  chat_failed:            "AI 回复失败",
  saved:                  "已保存到历史记录",
  save_failed:            "保存失败",
  downloaded:             "已下载",
  download_failed:        "下载失败",
  copied:                 "已复制到剪贴板",
  copy_manual:            "无法访问剪贴板，请手动选择复制",
  history_cleared:        "历史记录已清空",
  clear_failed:           "清空历史记录失败",
  history_load_failed:    "无法读取历史记录",
  history_exported:       "历史记录已导出",
  export_failed:          "导出失败",
  reset_done:             "已重新开始",
  help_failed:            "无法获取帮助信息",
  language_save_failed:   "无法保存语言设置",
  help_title:             "帮助",

  report_title:           "易经占卜结果",
  report_question:        "问题",
  report_diviner:         "占卜者",
  report_time:            "时间",
  report_original:        "本卦",
  report_changed:         "变卦",
  report_interpretation:  "解读",
  report_notes:           "备注",
  report_footer:          "—— 易经占卜",
  report_file_prefix:     "易经占卜结果",

  keys_workbench:         "Tab 切换  F1 帮助  F2 历史  F3 语言  F4 纳甲  F5 方式  F6 起卦  F7/F8 视图  ^S 保存  ^D 下载  ^Y 复制  ^R 重置  ^Q 退出",
  keys_history:           "↑↓ 选择  Enter 查看  x 清空  e 导出  Esc 返回",
  keys_overlay:           "Esc 关闭",
};

pub static EN: Strings = Strings {
  app_title:              "I Ching Divination",
  online:                 "online",
  offline:                "offline",

  question:               "Question",
  question_placeholder:   "Enter the question you want to ask",
  diviner:                "Diviner",
  anonymous:              "Anonymous",
  notes:                  "Notes",
  method:                 "Method",
  coins:                  "Coins",
  numbers:                "Numbers",
  time:                   "Time",
  random:                 "Random",
  digits_hint:            "Enter at least two digits",
  throwing:               "Throwing",
  input_ready:            "Cast",
  najia_toggle:           "Najia",
  divining:               "Divining…",
  submit_hint:            "Ctrl+Enter to divine",

  original:               "Original",
  changed:                "Changed",
  mutual:                 "Mutual",
  najia:                  "Najia",
  interpretation:         "Interpretation",
  changing_lines:         "Changing lines",
  no_changes:             "No changing lines",
  no_result:              "No divination yet. Type a question and press Ctrl+Enter.",
  judgement:              "Judgement",
  image:                  "Image",
  world_line:             "World line",
  response_line:          "Response line",
  void_lines:             "Void",

  chat_title:             "Ask the AI",
  chat_empty:             "Ask a follow-up about this hexagram",
  chat_needs_result:      "Divine first to chat with the AI",
  thinking:               "Thinking…",
  you:                    "You",
  assistant:              "AI",

  history_title:          "History",
  history_empty:          "No saved divinations",
  history_hint:           "↑↓ select  Enter view  x clear  e export  Esc back",
  record_interpretation:  "This is a saved record; only names and notes were kept.",
  viewing_record:         "Viewing a saved record",

  divination_done:        "Divination complete",
  divination_failed:      "Divination failed",
  fallback_interpretation: "The divination service is unreachable. Showing a locally generated sample result.",
  refresh_failed:         "Refresh after language change failed",
  chat_failed:            "AI reply failed",
  saved:                  "Saved to history",
  save_failed:            "Save failed",
  downloaded:             "Downloaded",
  download_failed:        "Download failed",
  copied:                 "Copied to clipboard",
  copy_manual:            "Clipboard unavailable; select the text to copy it",
  history_cleared:        "History cleared",
  clear_failed:           "Could not clear history",
  history_load_failed:    "Could not read history",
  history_exported:       "History exported",
  export_failed:          "Export failed",
  reset_done:             "Started over",
  help_failed:            "Could not load help",
  language_save_failed:   "Could not save the language setting",
  help_title:             "Help",

  report_title:           "I Ching Divination Result",
  report_question:        "Question",
  report_diviner:         "Diviner",
  report_time:            "Time",
  report_original:        "Original hexagram",
  report_changed:         "Changed hexagram",
  report_interpretation:  "Interpretation",
  report_notes:           "Notes",
  report_footer:          "-- I Ching Divination",
  report_file_prefix:     "iching_divination",

  keys_workbench:         "Tab focus  F1 help  F2 history  F3 language  F4 najia  F5 method  F6 cast  F7/F8 view  ^S save  ^D download  ^Y copy  ^R reset  ^Q quit",
  keys_history:           "↑↓ select  Enter view  x clear  e export  Esc back",
  keys_overlay:           "Esc close",
};

impl Strings {
  pub fn for_language(language: Language) -> &'static Self {
    match language {
      Language::Zh => &ZH,
      Language::En => &EN,
    }
  }

  pub fn method_name(&self, method: DivinationMethod) -> &'static str {
    match method {
      DivinationMethod::Coins => self.coins,
      DivinationMethod::Numbers => self.numbers,
      DivinationMethod::Time => self.time,
      DivinationMethod::Random => self.random,
    }
  }
}

// ─── Provider ────────────────────────────────────────────────────────────────

/// The active language, persisted under [`LANGUAGE_KEY`].
pub struct Localization<S> {
  storage:  S,
  language: Language,
}

impl<S: Storage> Localization<S> {
  /// Read the persisted code; `default` applies when nothing is stored or
  /// storage fails, and unknown codes fall back to Chinese.
  pub fn new(storage: S, default: Language) -> Self {
    let language = match storage.get(LANGUAGE_KEY) {
      Ok(Some(code)) => Language::from_code_or_default(&code),
      Ok(None) => default,
      Err(e) => {
        tracing::warn!(error = %e, "could not read language; using default");
        default
      }
    };
    Self { storage, language }
  }

  pub fn language(&self) -> Language { self.language }

  pub fn strings(&self) -> &'static Strings { Strings::for_language(self.language) }

  /// Persist, then switch. Returns whether the language actually changed;
  /// when persisting fails the active language is left as it was.
  pub fn set_language(&mut self, language: Language) -> Result<bool> {
    self.storage.set(LANGUAGE_KEY, language.code()).map_err(Error::storage)?;
    let changed = self.language != language;
    self.language = language;
    Ok(changed)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use yijing_core::storage::MemoryStorage;

  use super::*;
  use crate::testing::FlakyStorage;

  #[test]
  fn missing_code_uses_configured_default() {
    let l = Localization::new(MemoryStorage::new(), Language::En);
    assert_eq!(l.language(), Language::En);
    assert_eq!(l.strings().anonymous, "Anonymous");
  }

  #[test]
  fn unknown_code_falls_back_to_chinese() {
    let s = MemoryStorage::new();
    s.set(LANGUAGE_KEY, "klingon").unwrap();
    let l = Localization::new(s, Language::En);
    assert_eq!(l.language(), Language::Zh);
    assert_eq!(l.strings().anonymous, "匿名");
  }

  #[test]
  fn set_language_persists_and_reports_change() {
    let s = Arc::new(MemoryStorage::new());
    let mut l = Localization::new(Arc::clone(&s), Language::Zh);
    assert!(l.set_language(Language::En).unwrap());
    assert_eq!(s.get(LANGUAGE_KEY).unwrap().as_deref(), Some("en"));
    assert!(!l.set_language(Language::En).unwrap());

    let reloaded = Localization::new(s, Language::Zh);
    assert_eq!(reloaded.language(), Language::En);
  }

  #[test]
  fn unsaved_language_is_not_applied() {
    let s = Arc::new(FlakyStorage::default());
    let mut l = Localization::new(Arc::clone(&s), Language::Zh);
    s.fail_writes(true);
    assert!(l.set_language(Language::En).is_err());
    assert_eq!(l.language(), Language::Zh);
  }

  #[test]
  fn method_names_are_localized() {
    assert_eq!(ZH.method_name(DivinationMethod::Coins), "铜钱");
    assert_eq!(EN.method_name(DivinationMethod::Time), "Time");
  }
}
