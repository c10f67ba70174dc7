//! Prompt templates and placeholder substitution.
//!
//! Templates contain exactly two placeholders, `{context}` and `{question}`. Substituted
//! values are inserted verbatim and never re-scanned, so a question that itself contains
//! `{context}` stays as typed. No escaping is applied to either value.

use magen_config::{PromptVariant, TemplateSet};

pub const CONTEXT_PLACEHOLDER: &str = "{context}";
pub const QUESTION_PLACEHOLDER: &str = "{question}";

const CONCISE_DIRECT: &str = "
אתה עוזר חכם לפיקוד העורף בישראל.
המטרה שלך היא לספק תשובות מדויקות, אמינות ועדכניות לשאלות הקשורות למצבי חירום בישראל.

🔹 השתמש אך ורק במידע המובא למטה.
🔹 אם אין במידע תשובה ברורה — ציין במפורש: \"לא נמצאה תשובה מבוססת במידע הנתון.\"
🔹 כתוב בעברית תקנית, רהוטה ורשמית, בסגנון המתאים לפרסום של רשות ממשלתית.
🔹 סדר את התשובה בצורה ברורה, עם סעיפים ממוספרים אם צריך.
🔹 בסיום התשובה, הוסף שורת מקורות עם שמות הקבצים שהתבססת עליהם.

📄 מידע רלוונטי:
{context}

❓ שאלה:
{question}

📝 תשובה:
";

const CONCISE_STEPBACK: &str = "
לפני שתענה ישירות על השאלה, קח צעד אחורה:
1. נתח את ההקשר הכללי של המצב.
2. קבע מהו המידע הקריטי שחייב להופיע בתשובה.
3. התמקד בהנחיות ברורות ומעשיות לשואל.
אל תציג את שלבי החשיבה, רק את התשובה הסופית.

🔹 כתוב בעברית תקנית, רהוטה ורשמית.
🔹 ענה אך ורק בהתבסס על המידע הבא.

📄 מידע רלוונטי:
{context}

❓ שאלה:
{question}

📝 תשובה:
";

const CHRONOLOGICAL_DIRECT: &str = "
אתה עוזר חכם לפיקוד העורף בישראל.

המטרה שלך היא לספק תשובות מדויקות, ברורות, תמציתיות, ובשפה תקנית גבוהה, מותאמת לפרסום רשמי מטעם רשות ממשלתית.

🔹 הנחיות חובה:
- ענה אך ורק על בסיס המידע המובא מטה.
- אם אין תשובה ברורה במידע — ציין במפורש: \"לא נמצאה תשובה מבוססת במידע הנתון.\"
- סדר את הצעדים לפי סדר זמן והקשר:
  - התחל בפעולות מיידיות שיש לבצע במהלך האירוע.
  - המשך בפעולות שיש לבצע מיד לאחר סיום האירוע.
  - רק לאחר מכן, פרט הכנות או הרחבות כלליות (אם יש צורך).
- כתוב משפטים קצרים, ברורים, ללא חזרתיות וללא סרבול.
- שמור על עברית תקנית, רהוטה ורשמית, מותאמת להנחיות לציבור.
- אם המשתמש שאל באנגלית, ענה בשפה האנגלית.
- בסיום התשובה, הוסף שורת מקורות: \"מקורות: [שמות הקבצים שהתבססו עליהם]\".

🔹 דגשים נוספים:
- כתוב בלשון סביל (עברית) או Passive Voice (אנגלית) כשמתאים.
- הימנע מתיאורים רגשיים או המלצות כלליות לא הכרחיות.

📄 מידע רלוונטי:
{context}

❓ שאלה:
{question}

📝 תשובה:
";

const CHRONOLOGICAL_STEPBACK: &str = "
לפני כתיבת התשובה, בצע ניתוח פנימי קצר:

1. זיהוי הפעולות המיידיות והמעשיות ביותר להצלת חיים תוך כדי האירוע.
2. סדר את הצעדים לפי סדר זמן ברור:
   - פעולות דחופות במהלך האירוע.
   - פעולות מיידיות לאחר סיום האירוע.
   - רק לאחר מכן, הכנות והרחבות כלליות (אם יש צורך).
3. כתוב את התשובה ישירות - אין לתאר את שלבי החשיבה.

כללי ניסוח:
- כתוב עברית תקנית, רהוטה ורשמית (או באנגלית, אם השאלה באנגלית).
- תן עדיפות לברירות מיידיות והימנע מהכנסת מידע שאינו הכרחי.

📄 מידע רלוונטי:
{context}

❓ שאלה:
{question}

📝 תשובה:
";

pub fn template(set: TemplateSet, variant: PromptVariant) -> &'static str {
	match (set, variant) {
		(TemplateSet::Concise, PromptVariant::Direct) => CONCISE_DIRECT,
		(TemplateSet::Concise, PromptVariant::Stepback) => CONCISE_STEPBACK,
		(TemplateSet::Chronological, PromptVariant::Direct) => CHRONOLOGICAL_DIRECT,
		(TemplateSet::Chronological, PromptVariant::Stepback) => CHRONOLOGICAL_STEPBACK,
	}
}

/// Fills `{context}` and `{question}` in one left-to-right pass.
pub fn assemble(template: &str, context: &str, question: &str) -> String {
	let mut out = String::with_capacity(template.len() + context.len() + question.len());
	let mut rest = template;

	while let Some(start) = rest.find('{') {
		let (head, tail) = rest.split_at(start);

		out.push_str(head);

		if let Some(after) = tail.strip_prefix(CONTEXT_PLACEHOLDER) {
			out.push_str(context);

			rest = after;
		} else if let Some(after) = tail.strip_prefix(QUESTION_PLACEHOLDER) {
			out.push_str(question);

			rest = after;
		} else {
			out.push('{');

			rest = &tail[1..];
		}
	}

	out.push_str(rest);

	out
}

/// Prompt for the zero-result path: general knowledge only, no sources.
pub fn fallback_prompt(question: &str) -> String {
	format!(
		"ענה לשאלה הבאה לפי ידע כללי בלבד:\n\n{question}\n\n(הערה: תשובה זו מבוססת על ידע כללי ואינה נתמכת במסמכים רשמיים)."
	)
}

pub fn title_prompt(question: &str, answer: &str) -> String {
	format!(
		"
Based on the following chat exchange, generate a concise and descriptive title (maximum 30 characters).
The title should capture the main topic or question being discussed.

User: {question}

Answer: {answer}

Generate a title in Hebrew that summarizes this exchange.
"
	)
}
