/// HTML Select Module
///
/// Collects options, optgroups and attributes, then renders a `<select>`
/// element as a string. Attribute values and option texts are HTML-escaped;
/// event attribute names keep only ASCII letters, digits, `-` and `_`.

use chrono::Datelike;
use std::fmt::Write;
use std::str::FromStr;

/// Language for the week and month name ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idiom {
    Pt,
    En,
    Es,
}

impl FromStr for Idiom {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pt" => Ok(Idiom::Pt),
            "en" => Ok(Idiom::En),
            "es" => Ok(Idiom::Es),
            other => Err(format!("Unsupported idiom '{}'", other)),
        }
    }
}

impl Idiom {
    /// Weekday names, Sunday first.
    pub fn weekdays(&self) -> [&'static str; 7] {
        match self {
            Idiom::Pt => ["Domingo", "Segunda", "Terça", "Quarta", "Quinta", "Sexta", "Sábado"],
            Idiom::En => ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"],
            Idiom::Es => ["Domingo", "Lunes", "Martes", "Miércoles", "Jueves", "Viernes", "Sábado"],
        }
    }

    /// Month names, January first.
    pub fn months(&self) -> [&'static str; 12] {
        match self {
            Idiom::Pt => [
                "Janeiro", "Fevereiro", "Março", "Abril", "Maio", "Junho", "Julho", "Agosto", "Setembro",
                "Outubro", "Novembro", "Dezembro",
            ],
            Idiom::En => [
                "January", "February", "March", "April", "May", "June", "July", "August", "September",
                "October", "November", "December",
            ],
            Idiom::Es => [
                "Enero", "Febrero", "Marzo", "Abril", "Mayo", "Junio", "Julio", "Agosto", "Septiembre",
                "Octubre", "Noviembre", "Diciembre",
            ],
        }
    }
}

#[derive(Debug, Clone)]
struct SelectOption {
    value: String,
    text: String,
}

/// Builder for one `<select>` element.
#[derive(Debug, Clone)]
pub struct SelectElement {
    id: String,
    css_classes: Vec<String>,
    inline_style: Vec<(String, String)>,
    behaviour: Vec<(String, String)>,
    options: Vec<SelectOption>,
    // (index of the first option in the group, label)
    groups: Vec<(usize, String)>,
    selected: Option<String>,
    autofocus: bool,
    multiple: bool,
    required: bool,
}

impl SelectElement {
    /// New element; `id` is used for both the `id` and `name` attributes.
    pub fn new(id: impl Into<String>) -> Self {
        SelectElement {
            id: id.into(),
            css_classes: Vec::new(),
            inline_style: Vec::new(),
            behaviour: Vec::new(),
            options: Vec::new(),
            groups: Vec::new(),
            selected: None,
            autofocus: false,
            multiple: false,
            required: false,
        }
    }

    pub fn add_class(&mut self, class: impl Into<String>) -> &mut Self {
        self.css_classes.push(class.into());
        self
    }

    pub fn set_multiple(&mut self) -> &mut Self {
        self.multiple = true;
        self
    }

    /// Sets an inline style property, replacing an earlier value for it.
    pub fn add_style(&mut self, property: impl Into<String>, value: impl Into<String>) -> &mut Self {
        upsert(&mut self.inline_style, property.into(), value.into());
        self
    }

    pub fn set_autofocus(&mut self) -> &mut Self {
        self.autofocus = true;
        self
    }

    pub fn set_required(&mut self, required: bool) -> &mut Self {
        self.required = required;
        self
    }

    /// Attaches a script to an event attribute such as `onchange`.
    pub fn add_behaviour(&mut self, event: impl Into<String>, command: impl Into<String>) -> &mut Self {
        upsert(&mut self.behaviour, event.into(), command.into());
        self
    }

    pub fn add_option(&mut self, value: impl ToString, text: impl ToString) -> &mut Self {
        self.options.push(SelectOption {
            value: value.to_string(),
            text: text.to_string(),
        });
        self
    }

    /// Opens an optgroup starting at the next option added.
    pub fn add_group(&mut self, label: impl Into<String>) -> &mut Self {
        self.groups.push((self.options.len(), label.into()));
        self
    }

    pub fn set_selected(&mut self, value: impl ToString) -> &mut Self {
        self.selected = Some(value.to_string());
        self
    }

    /// Numeric options from `first` to `last` inclusive, counting down when `first > last`.
    pub fn add_range(&mut self, first: i64, last: i64) -> &mut Self {
        if first <= last {
            for i in first..=last {
                self.add_option(i, i);
            }
        } else {
            for i in (last..=first).rev() {
                self.add_option(i, i);
            }
        }
        self
    }

    /// Appends `(value, text)` pairs.
    pub fn add_options<V, T, I>(&mut self, options: I) -> &mut Self
    where
        V: ToString,
        T: ToString,
        I: IntoIterator<Item = (V, T)>,
    {
        for (value, text) in options {
            self.add_option(value, text);
        }
        self
    }

    /// Weekdays valued 1 (Sunday) to 7 (Saturday).
    pub fn add_week_range(&mut self, idiom: Idiom) -> &mut Self {
        for (i, name) in idiom.weekdays().iter().enumerate() {
            self.add_option(i + 1, name);
        }
        self
    }

    /// Months valued 1 to 12, optionally starting at the current month.
    pub fn add_month_range(&mut self, idiom: Idiom, from_current_month: bool) -> &mut Self {
        let first = if from_current_month {
            chrono::Local::now().month()
        } else {
            1
        };
        self.add_month_range_from(idiom, first)
    }

    /// Months valued `first_month` to 12.
    pub fn add_month_range_from(&mut self, idiom: Idiom, first_month: u32) -> &mut Self {
        let months = idiom.months();
        for month in first_month.max(1)..=12 {
            self.add_option(month, months[(month - 1) as usize]);
        }
        self
    }

    /// The full `<select>` element.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = write!(out, "<select id=\"{0}\" name=\"{0}\"", escape(&self.id));
        if !self.css_classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", escape(&self.css_classes.join(" ")));
        }
        if !self.inline_style.is_empty() {
            let style: String = self
                .inline_style
                .iter()
                .map(|(property, value)| format!("{}:{};", property, value))
                .collect();
            let _ = write!(out, " style=\"{}\"", escape(&style));
        }
        if self.autofocus {
            out.push_str(" autofocus");
        }
        for (event, command) in &self.behaviour {
            let name = attribute_name(event);
            if !name.is_empty() {
                let _ = write!(out, " {}=\"{}\"", name, escape(command));
            }
        }
        if self.multiple {
            out.push_str(" multiple");
        }
        if self.required {
            out.push_str(" required");
        }
        out.push('>');
        out.push_str(&self.render_options());
        out.push_str("</select>");
        out
    }

    /// Only the `<option>`/`<optgroup>` markup.
    pub fn render_options(&self) -> String {
        let mut out = String::new();
        let mut group_open = false;
        let selected = self.selected.as_deref().map(str::trim);

        for (position, option) in self.options.iter().enumerate() {
            for (_, label) in self.groups.iter().filter(|(start, _)| *start == position) {
                if group_open {
                    out.push_str("</optgroup>");
                }
                let _ = write!(out, "<optgroup label=\"{}\">", escape(label));
                group_open = true;
            }

            let is_selected = selected == Some(option.value.trim());
            let _ = write!(
                out,
                "<option value=\"{}\"{}>{}</option>",
                escape(&option.value),
                if is_selected { " selected" } else { "" },
                escape(&option.text)
            );
        }

        if group_open {
            out.push_str("</optgroup>");
        }
        out
    }

    /// Changes the id (and name) and renders.
    pub fn render_with_id(&mut self, new_id: impl Into<String>) -> String {
        self.id = new_id.into();
        self.render()
    }
}

fn upsert(pairs: &mut Vec<(String, String)>, key: String, value: String) {
    match pairs.iter_mut().find(|(existing, _)| *existing == key) {
        Some(pair) => pair.1 = value,
        None => pairs.push((key, value)),
    }
}

fn attribute_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Escapes text for use in HTML content and double-quoted attributes.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    #[test]
    fn test_plain_select() {
        let mut select = SelectElement::new("size");
        select.add_option("s", "Small").add_option("l", "Large").set_selected("l");
        assert_snapshot!(
            select.render(),
            @r#"<select id="size" name="size"><option value="s">Small</option><option value="l" selected>Large</option></select>"#
        );
    }

    #[test]
    fn test_attributes() {
        let mut select = SelectElement::new("city");
        select
            .add_class("form-control")
            .add_class("wide")
            .add_style("width", "10em")
            .set_autofocus()
            .add_behaviour("onchange", "reload(this)")
            .set_multiple()
            .set_required(true);
        assert_snapshot!(
            select.render(),
            @r#"<select id="city" name="city" class="form-control wide" style="width:10em;" autofocus onchange="reload(this)" multiple required></select>"#
        );
    }

    #[test]
    fn test_groups() {
        let mut select = SelectElement::new("food");
        select
            .add_group("Meat")
            .add_option(1, "Doner")
            .add_option(2, "Shish")
            .add_group("Veg")
            .add_option(3, "Falafel");
        assert_snapshot!(
            select.render_options(),
            @r#"<optgroup label="Meat"><option value="1">Doner</option><option value="2">Shish</option></optgroup><optgroup label="Veg"><option value="3">Falafel</option></optgroup>"#
        );
    }

    #[test]
    fn test_ranges() {
        let mut up = SelectElement::new("n");
        up.add_range(1, 3);
        assert_eq!(
            up.render_options(),
            r#"<option value="1">1</option><option value="2">2</option><option value="3">3</option>"#
        );

        let mut down = SelectElement::new("n");
        down.add_range(3, 2);
        assert_eq!(
            down.render_options(),
            r#"<option value="3">3</option><option value="2">2</option>"#
        );
    }

    #[test]
    fn test_week_and_month_ranges() {
        let mut week = SelectElement::new("day");
        week.add_week_range(Idiom::En);
        let html = week.render_options();
        assert!(html.starts_with(r#"<option value="1">Sunday</option>"#));
        assert!(html.ends_with(r#"<option value="7">Saturday</option>"#));

        let mut months = SelectElement::new("month");
        months.add_month_range_from(Idiom::Pt, 11);
        assert_eq!(
            months.render_options(),
            r#"<option value="11">Novembro</option><option value="12">Dezembro</option>"#
        );

        let mut all = SelectElement::new("month");
        all.add_month_range(Idiom::Es, false);
        assert_eq!(all.render_options().matches("<option").count(), 12);
    }

    #[test]
    fn test_escaping_and_new_id() {
        let mut select = SelectElement::new("q");
        select.add_option("a\"b", "<x> & y");
        assert_eq!(
            select.render_with_id("r"),
            r#"<select id="r" name="r"><option value="a&quot;b">&lt;x&gt; &amp; y</option></select>"#
        );
    }

    #[test]
    fn test_event_names_cannot_break_out_of_the_tag() {
        let mut select = SelectElement::new("q");
        select
            .add_behaviour("onchange\" onclick=\"steal()", "go()")
            .add_behaviour("><script>", "x()");
        assert_snapshot!(
            select.render(),
            @r#"<select id="q" name="q" onchangeonclicksteal="go()" script="x()"></select>"#
        );
    }

    #[test]
    fn test_idiom_parsing() {
        assert_eq!("PT".parse::<Idiom>().unwrap(), Idiom::Pt);
        assert!("de".parse::<Idiom>().is_err());
    }
}
