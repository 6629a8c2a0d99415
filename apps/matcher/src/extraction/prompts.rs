// Prompt constants for the extraction passes.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for the summarization pass.
pub const SUMMARIZER_SYSTEM: &str = "\
You are a highly intelligent AI designed to generate concise, accurate, and clear summaries. \
Analyze the given text and produce a summary that preserves its core ideas and essential \
information. Keep every name, date, employer, institution, URL, email address, and phone \
number exactly as written. Focus on clarity and relevance, maintaining the original meaning.";

/// Per-chunk instruction for the summarization pass.
pub const SUMMARIZER_INSTRUCTION: &str = "\
Summarize the following text in a concise and clear manner, preserving its key points, \
main ideas, and important details.";

/// System prompt for the structured-extraction pass.
pub const EXTRACTOR_SYSTEM: &str = "\
You are a highly intelligent AI designed to extract structured information from resumes. \
Analyze the given resume text and return the extracted details in the JSON schema described \
by the user. You output JSON only.";

/// Per-chunk instruction for the structured-extraction pass.
/// Replace `{example}`, `{fence_instruction}` and `{omit_instruction}` before use.
pub const EXTRACTOR_INSTRUCTION_TEMPLATE: &str = r#"Extract the resume into this JSON structure:
{
  "basics": {
    "name": "full name (required)",
    "label": "professional title",
    "email": "email address (required)",
    "phone": "phone number",
    "url": "personal website, full http(s) URL",
    "summary": "short professional summary (required)",
    "location": {"address": "", "postalCode": "", "city": "", "countryCode": "", "region": ""},
    "profiles": [{"network": "GitHub", "username": "", "url": "full http(s) URL"}]
  },
  "work": [{"name": "employer", "position": "", "url": "", "startDate": "YYYY-MM-DD", "endDate": "YYYY-MM-DD", "summary": "", "highlights": [""]}],
  "volunteer": [{"organization": "", "position": "", "url": "", "startDate": "YYYY-MM-DD", "endDate": "YYYY-MM-DD", "summary": "", "highlights": [""]}],
  "education": [{"institution": "", "url": "", "area": "field of study", "studyType": "degree", "startDate": "YYYY-MM-DD", "endDate": "YYYY-MM-DD", "score": "", "courses": [""]}],
  "awards": [{"title": "", "date": "YYYY-MM-DD", "awarder": "", "summary": ""}],
  "certificates": [{"name": "", "date": "YYYY-MM-DD", "issuer": "", "url": ""}],
  "publications": [{"name": "", "publisher": "", "releaseDate": "YYYY-MM-DD", "url": "", "summary": ""}],
  "skills": [{"name": "", "level": "", "keywords": [""]}],
  "languages": [{"language": "", "fluency": ""}],
  "interests": [{"name": "", "keywords": [""]}],
  "references": [{"name": "", "reference": ""}],
  "projects": [{"name": "", "startDate": "YYYY-MM-DD", "endDate": "YYYY-MM-DD", "description": "", "highlights": [""], "url": ""}]
}

FIELD RULES:
1. `basics`, `education`, `skills` and `projects` are the core sections; extract them whenever the text supports them.
2. Every date must be formatted as YYYY-MM-DD. Use the first day of the month or year when only a month or year is known.
3. A `startDate` must never be later than its `endDate`.
4. Every `url` must be a complete http:// or https:// address.
5. `skills` items may be plain strings or objects with `name`, `level`, `keywords`.

{omit_instruction}

WORKED EXAMPLE (a complete, valid output):
```json
{example}
```

{fence_instruction}"#;

/// Built-in worked example used when no reference corpus file is configured.
pub const BUILTIN_EXAMPLE: &str = r#"{
  "basics": {
    "name": "Richard Hendriks",
    "label": "Programmer",
    "email": "richard.hendriks@mail.com",
    "phone": "(912) 555-4321",
    "url": "http://richardhendricks.example.com",
    "summary": "Software engineer focused on compression algorithms and distributed storage.",
    "location": {
      "address": "2712 Broadway St",
      "postalCode": "94115",
      "city": "San Francisco",
      "countryCode": "US",
      "region": "California"
    },
    "profiles": [
      {"network": "GitHub", "username": "rhendriks", "url": "https://github.com/rhendriks"}
    ]
  },
  "work": [
    {
      "name": "Pied Piper",
      "position": "CEO/President",
      "url": "http://piedpiper.example.com",
      "startDate": "2013-12-01",
      "endDate": "2014-12-01",
      "summary": "Pied Piper is a multi-platform technology based on a proprietary compression algorithm.",
      "highlights": ["Built an algorithm for artist to detect if their music was violating copy right infringement laws"]
    }
  ],
  "education": [
    {
      "institution": "University of Oklahoma",
      "url": "https://www.ou.edu/",
      "area": "Information Technology",
      "studyType": "Bachelor",
      "startDate": "2011-06-01",
      "endDate": "2014-01-01",
      "score": "4.0",
      "courses": ["DB1101 - Basic SQL"]
    }
  ],
  "skills": [
    {"name": "Web Development", "level": "Master", "keywords": ["HTML", "CSS", "JavaScript"]},
    "Compression"
  ],
  "languages": [{"language": "English", "fluency": "Native speaker"}],
  "projects": [
    {
      "name": "Miss Direction",
      "description": "A mapping engine that misguides you",
      "highlights": ["Won award at AIHacks 2016"],
      "startDate": "2016-08-24",
      "endDate": "2016-08-24",
      "url": "http://missdirection.example.com"
    }
  ]
}"#;

/// Repair-mode input. Replace `{section}` and `{content}` before use.
pub const REPAIR_DESCRIPTION_TEMPLATE: &str = "Invalid section detected: {section}. Data: {content}";

/// Appended to the repair description when the run's source summary is known.
pub const REPAIR_SUMMARY_HEADER: &str = "Source resume summary:";
